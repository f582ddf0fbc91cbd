//! Participant table exhaustion.
//!
//! Lives in its own test binary: it deliberately claims every slot group in
//! the process-wide registry.

use zincir_list::{TxnError, VersionedList};

#[test]
fn begin_fails_recoverably_when_registry_is_full() {
    let list: VersionedList<u64> = VersionedList::new();
    list.insert_tail(1);

    let mut txns = Vec::new();
    for _ in 0..zincir::MAX_PARTICIPANTS {
        txns.push(list.begin().unwrap());
    }

    // Table exhausted: no guard can be leased.
    assert!(zincir::try_pin().is_none());
    assert!(matches!(list.begin(), Err(TxnError::RegistryFull)));

    // Releasing one participant makes begin work again.
    txns.pop().unwrap().rollback();
    let txn = list.begin().unwrap();
    assert!(txn.contains(1));
    txn.rollback();
}
