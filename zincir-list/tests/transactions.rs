use zincir_list::VersionedList;

fn collected(list: &VersionedList<u64>) -> Vec<u64> {
    list.iter().collect()
}

fn preview(txn: &zincir_list::Transaction<'_, u64>) -> Vec<u64> {
    let mut out = Vec::new();
    txn.for_each(|e| out.push(e));
    out
}

#[test]
fn staged_operations_apply_on_commit() {
    let list = VersionedList::new();
    list.insert_tail(1);
    list.insert_tail(2);

    let mut txn = list.begin().unwrap();
    txn.insert_after(1, 42);
    txn.insert_tail(99);
    txn.remove(2);

    // The transaction previews its own outcome...
    assert_eq!(preview(&txn), vec![1, 42, 99]);
    // ...while the list is untouched until commit.
    assert_eq!(collected(&list), vec![1, 2]);

    txn.commit();
    assert_eq!(collected(&list), vec![1, 42, 99]);
    assert_eq!(list.len(), 3);
}

#[test]
fn rollback_discards_staging() {
    let list = VersionedList::new();
    list.insert_tail(1);

    let mut txn = list.begin().unwrap();
    txn.insert_tail(2);
    txn.remove(1);
    txn.rollback();

    assert_eq!(collected(&list), vec![1]);
    assert_eq!(list.len(), 1);
}

#[test]
fn drop_without_commit_is_rollback() {
    let list = VersionedList::new();
    list.insert_tail(1);

    {
        let mut txn = list.begin().unwrap();
        txn.insert_head(7);
        txn.remove(1);
    }

    assert_eq!(collected(&list), vec![1]);
}

#[test]
fn insert_after_siblings_keep_staging_order() {
    let list = VersionedList::new();
    list.insert_tail(0);

    let mut txn = list.begin().unwrap();
    txn.insert_after(0, 10);
    txn.insert_after(0, 11);
    txn.commit();

    assert_eq!(collected(&list), vec![0, 10, 11]);
}

#[test]
fn head_inserts_commit_first_staged_nearest_head() {
    let list = VersionedList::new();
    list.insert_tail(9);

    let mut txn = list.begin().unwrap();
    txn.insert_head(1);
    txn.insert_head(2);
    txn.commit();

    assert_eq!(collected(&list), vec![1, 2, 9]);
}

#[test]
fn empty_commit_is_a_noop() {
    let list = VersionedList::new();
    list.insert_tail(1);
    list.insert_tail(2);

    let txn = list.begin().unwrap();
    txn.commit();

    assert_eq!(collected(&list), vec![1, 2]);
    assert_eq!(list.len(), 2);
}

#[test]
fn remove_cancels_staged_inserts() {
    let list = VersionedList::new();
    list.insert_tail(1);

    let mut txn = list.begin().unwrap();
    txn.insert_head(10);
    txn.insert_tail(11);
    txn.insert_after(1, 12);

    txn.remove(10);
    txn.remove(11);
    txn.remove(12);

    assert!(!txn.contains(10));
    assert!(!txn.contains(11));
    assert!(!txn.contains(12));
    assert_eq!(preview(&txn), vec![1]);

    txn.commit();
    assert_eq!(collected(&list), vec![1]);
}

#[test]
fn contains_merges_staging_and_snapshot() {
    let list = VersionedList::new();
    list.insert_tail(1);
    list.insert_tail(2);

    let mut txn = list.begin().unwrap();
    txn.insert_tail(3);
    txn.remove(2);

    assert!(txn.contains(1)); // visible at snapshot
    assert!(!txn.contains(2)); // staged for removal
    assert!(txn.contains(3)); // staged insert
    assert!(!txn.contains(4)); // nowhere
}

#[test]
fn transaction_reads_its_snapshot_not_the_live_list() {
    let list = VersionedList::new();
    list.insert_tail(1);

    let txn = list.begin().unwrap();

    // Mutations after the snapshot are invisible to the transaction.
    list.insert_tail(2);
    list.remove(1);

    assert!(txn.contains(1));
    assert!(!txn.contains(2));
    assert_eq!(preview(&txn), vec![1]);

    txn.rollback();
    assert_eq!(collected(&list), vec![2]);
}

#[test]
fn removing_an_element_missing_at_snapshot_is_a_noop() {
    let list = VersionedList::new();
    list.insert_tail(1);

    let txn = list.begin().unwrap();

    // Inserted after the snapshot was taken.
    list.insert_tail(2);

    let mut txn = txn;
    txn.remove(2);
    txn.commit();

    // The post-snapshot element survived the commit.
    assert_eq!(collected(&list), vec![1, 2]);
}

#[test]
fn concurrent_transactions_on_distinct_threads() {
    use std::sync::Arc;
    use std::thread;

    let list = Arc::new(VersionedList::new());
    let mut handles = vec![];

    for t in 0..4u64 {
        let list = list.clone();
        handles.push(thread::spawn(move || {
            let mut txn = list.begin().unwrap();
            txn.insert_tail(t * 2);
            txn.insert_head(t * 2 + 1);
            txn.commit();
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(list.len(), 8);
    for e in 0..8 {
        assert!(list.contains(e));
    }
}
