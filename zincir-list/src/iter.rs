//! Snapshot iteration.

use core::marker::PhantomData;
use core::ptr;

use zincir::{pin, Guard};

use crate::list::VersionedList;
use crate::node::Node;

/// An iterator over the elements visible at a fixed snapshot.
///
/// Created by [`VersionedList::iter`]. For its whole lifetime the iterator
/// holds a hazard on its current node and publishes its snapshot version,
/// so the nodes it has yet to visit are neither reclaimed under it nor
/// hidden by later removals.
pub struct SnapshotIter<'a, E> {
    guard: Guard,
    snapshot: u64,
    /// Next node to yield, hazard-protected in `slot`. Null at the end.
    curr: *mut Node<E>,
    slot: usize,
    _list: PhantomData<&'a VersionedList<E>>,
}

impl<'a, E: Copy + Eq + Send + 'static> SnapshotIter<'a, E> {
    pub(crate) fn new(list: &'a VersionedList<E>) -> Self {
        let guard = pin();
        let snapshot = list.clock.current();
        guard.set_snapshot(snapshot);
        let mut it = Self {
            guard,
            snapshot,
            curr: ptr::null_mut(),
            slot: 0,
            _list: PhantomData,
        };
        it.curr = list.head.protect(it.slot, &it.guard).as_raw();
        it.skip_invisible();
        it
    }

    /// The snapshot version this iterator reads at.
    pub fn snapshot(&self) -> u64 {
        self.snapshot
    }

    fn advance(&mut self, node: &Node<E>) {
        self.curr = node.next.protect(1 - self.slot, &self.guard).as_raw();
        self.slot = 1 - self.slot;
    }

    fn skip_invisible(&mut self) {
        while !self.curr.is_null() {
            // SAFETY: curr is hazard-protected and non-null
            let node = unsafe { &*self.curr };
            if node.visible_at(self.snapshot) {
                return;
            }
            self.advance(node);
        }
    }
}

impl<'a, E: Copy + Eq + Send + 'static> Iterator for SnapshotIter<'a, E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if self.curr.is_null() {
            return None;
        }
        // SAFETY: curr is hazard-protected and non-null
        let node = unsafe { &*self.curr };
        let elm = node.elm;
        self.advance(node);
        self.skip_invisible();
        Some(elm)
    }
}
