//! Lock-free MVCC linked list built on zincir's hazard-slot reclamation.
//!
//! # Architecture
//!
//! Every structural change consumes one value of a per-list version clock.
//! A node carries the version it was inserted at and, once removed, the
//! version it was tombstoned at; a reader sees exactly the nodes whose
//! version window spans its snapshot. Removal is therefore logical: the
//! node stays on the chain until a reclaim pass unlinks tombstones older
//! than every pinned snapshot and hands them to zincir to free once no
//! hazard cell publishes them.
//!
//! - **Reads**: lock-free traversal under hazard protection; `contains`,
//!   `len` and the snapshot iterator never block writers.
//! - **Writes**: single-CAS linearization per operation, retry on
//!   contention, restart from the head rather than helping.
//! - **Transactions**: optimistic. Operations stage in buffers against a
//!   pinned snapshot and apply on commit; rollback never touches the list.
//!
//! # Example
//!
//! ```
//! use zincir_list::VersionedList;
//!
//! let list: VersionedList<u64> = VersionedList::new();
//! list.insert_tail(1);
//! list.insert_tail(2);
//!
//! let mut txn = list.begin().unwrap();
//! txn.insert_after(1, 42);
//! txn.remove(2);
//! txn.commit();
//!
//! assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 42]);
//! ```

mod clock;
mod error;
mod iter;
mod list;
mod node;
mod reclaim;
mod txn;

pub use error::TxnError;
pub use iter::SnapshotIter;
pub use list::VersionedList;
pub use txn::Transaction;
