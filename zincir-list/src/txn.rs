//! Optimistic transactions.
//!
//! A transaction captures a snapshot version, publishes it so reclamation
//! cannot outrun it, and stages its operations in buffers that only touch
//! the list on commit. Staged operations apply in a fixed order at commit;
//! each applied operation is individually linearizable, but two concurrent
//! committers may interleave — callers needing serializable commits
//! serialize them externally.

use zincir::{try_pin, Guard};

use crate::error::TxnError;
use crate::list::VersionedList;

/// A staged batch of list operations against a captured snapshot.
///
/// Created by [`VersionedList::begin`]. Must be driven by a single thread;
/// dropping it without [`commit`](Transaction::commit) is a rollback.
pub struct Transaction<'a, E> {
    list: &'a VersionedList<E>,
    guard: Guard,
    snapshot: u64,
    ins_head: Vec<E>,
    ins_tail: Vec<E>,
    /// (anchor, element) pairs, in staging order.
    ins_after: Vec<(E, E)>,
    removed: Vec<E>,
}

impl<E: Copy + Eq + Send + 'static> VersionedList<E> {
    /// Starts a transaction pinned at the current snapshot.
    ///
    /// Fails when no participant slot group is free to publish the
    /// snapshot in.
    pub fn begin(&self) -> Result<Transaction<'_, E>, TxnError> {
        let guard = try_pin().ok_or(TxnError::RegistryFull)?;
        let snapshot = self.clock.current();
        guard.set_snapshot(snapshot);
        Ok(Transaction {
            list: self,
            guard,
            snapshot,
            ins_head: Vec::new(),
            ins_tail: Vec::new(),
            ins_after: Vec::new(),
            removed: Vec::new(),
        })
    }
}

impl<'a, E: Copy + Eq + Send + 'static> Transaction<'a, E> {
    /// The snapshot version this transaction reads at.
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    /// Stages a head insert.
    pub fn insert_head(&mut self, elm: E) {
        self.ins_head.push(elm);
    }

    /// Stages a tail insert.
    pub fn insert_tail(&mut self, elm: E) {
        self.ins_tail.push(elm);
    }

    /// Stages an insert of `elm` after `anchor`.
    pub fn insert_after(&mut self, anchor: E, elm: E) {
        self.ins_after.push((anchor, elm));
    }

    /// Stages a removal.
    ///
    /// A staged insert of the same element is cancelled instead (no list
    /// effect, the caller keeps ownership); an element not visible at the
    /// snapshot is a no-op.
    pub fn remove(&mut self, elm: E) {
        if let Some(i) = self.ins_head.iter().position(|&e| e == elm) {
            self.ins_head.remove(i);
            return;
        }
        if let Some(i) = self.ins_tail.iter().position(|&e| e == elm) {
            self.ins_tail.remove(i);
            return;
        }
        if let Some(i) = self.ins_after.iter().position(|&(_, e)| e == elm) {
            self.ins_after.remove(i);
            return;
        }
        if self.visible_in_list(elm) {
            self.removed.push(elm);
        }
    }

    /// Membership in the transaction's view: staged inserts count, staged
    /// removals do not, everything else defers to the snapshot.
    pub fn contains(&self, elm: E) -> bool {
        if self.ins_head.contains(&elm) || self.ins_tail.contains(&elm) {
            return true;
        }
        if self.ins_after.iter().any(|&(_, e)| e == elm) {
            return true;
        }
        if self.removed.contains(&elm) {
            return false;
        }
        self.visible_in_list(elm)
    }

    /// Visits the list as it would look right after a commit with no
    /// interleaving: staged head inserts latest first, then each visible
    /// unremoved node followed by the inserts staged after it, then staged
    /// tail inserts in order.
    pub fn for_each(&self, mut f: impl FnMut(E)) {
        for &e in self.ins_head.iter().rev() {
            f(e);
        }
        let mut slot = 0;
        let mut curr = self.list.head.protect(slot, &self.guard);
        while !curr.is_null() {
            // SAFETY: curr is hazard-protected and non-null
            let node = unsafe { curr.deref() };
            if node.visible_at(self.snapshot) && !self.removed.contains(&node.elm) {
                f(node.elm);
                for &(anchor, e) in &self.ins_after {
                    if anchor == node.elm {
                        f(e);
                    }
                }
            }
            curr = node.next.protect(1 - slot, &self.guard);
            slot = 1 - slot;
        }
        for &e in &self.ins_tail {
            f(e);
        }
    }

    /// Applies the staged operations.
    ///
    /// All staged removals tombstone with one freshly minted version; every
    /// applied insert mints its own. Head inserts apply in reverse staging
    /// order so the first staged one ends up nearest the head, and
    /// insert-after siblings chain behind the previously applied one so
    /// staging order is preserved left to right.
    pub fn commit(self) {
        let version = self.list.clock.next();
        for &e in &self.removed {
            self.tombstone_first_live(e, version);
        }

        let mut last_for_anchor: Vec<(E, E)> = Vec::with_capacity(self.ins_after.len());
        for &(anchor, elm) in &self.ins_after {
            let effective = last_for_anchor
                .iter()
                .find(|&&(a, _)| a == anchor)
                .map(|&(_, last)| last)
                .unwrap_or(anchor);
            self.list.insert_after(effective, elm);
            match last_for_anchor.iter_mut().find(|(a, _)| *a == anchor) {
                Some(entry) => entry.1 = elm,
                None => last_for_anchor.push((anchor, elm)),
            }
        }

        for &e in &self.ins_tail {
            self.list.insert_tail(e);
        }
        for &e in self.ins_head.iter().rev() {
            self.list.insert_head(e);
        }

        // Withdraw the snapshot before reclaiming so it does not pin the
        // pass below.
        self.guard.clear_snapshot();
        self.list.reclaim();
    }

    /// Discards the staged operations; the list is untouched and ownership
    /// of staged elements stays with the caller.
    pub fn rollback(self) {}

    fn visible_in_list(&self, elm: E) -> bool {
        let mut slot = 0;
        let mut curr = self.list.head.protect(slot, &self.guard);
        while !curr.is_null() {
            // SAFETY: curr is hazard-protected and non-null
            let node = unsafe { curr.deref() };
            if node.elm == elm && node.visible_at(self.snapshot) {
                return true;
            }
            curr = node.next.protect(1 - slot, &self.guard);
            slot = 1 - slot;
        }
        false
    }

    /// Tombstones the first live node holding `elm`; already-tombstoned
    /// matches are skipped.
    fn tombstone_first_live(&self, elm: E, version: u64) {
        let mut slot = 0;
        let mut curr = self.list.head.protect(slot, &self.guard);
        while !curr.is_null() {
            // SAFETY: curr is hazard-protected and non-null
            let node = unsafe { curr.deref() };
            if node.elm == elm && node.tombstone(version) {
                return;
            }
            curr = node.next.protect(1 - slot, &self.guard);
            slot = 1 - slot;
        }
    }
}
