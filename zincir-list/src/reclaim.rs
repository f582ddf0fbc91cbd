//! Physical unlinking of expired tombstones.

use core::ptr;

use zincir::{collect, min_active_snapshot, pin, Ordering};

use crate::list::{retire_node, VersionedList};
use crate::node::Node;

impl<E: Copy + Eq + Send + 'static> VersionedList<E> {
    /// Unlinks and retires every tombstone no pinned snapshot can still
    /// see, then frees whatever the hazard cells no longer protect.
    ///
    /// Runs automatically after a transaction commit; safe to call from any
    /// thread at any time. Unlinking is best effort: a node whose unlink
    /// CAS loses to a concurrent mutation stays for a later pass, and a
    /// pass that finds another already running returns immediately.
    pub fn reclaim(&self) {
        if self.reclaim_busy.swap(true, Ordering::AcqRel) {
            return;
        }

        let mut min_active = min_active_snapshot();
        if min_active == u64::MAX {
            min_active = self.clock.current();
        }

        let guard = pin();
        // prev keeps one hazard cell while curr rotates through the other;
        // a null prev means curr hangs off the list head.
        let mut prev: *mut Node<E> = ptr::null_mut();
        let mut curr_slot = 1;
        let mut curr = self.head.protect(curr_slot, &guard);

        while !curr.is_null() {
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            let removed = curr_ref.removed_version.load(Ordering::Acquire);
            let next = curr_ref.next.load(Ordering::Acquire, &guard);

            if removed != 0 && removed < min_active {
                let unlinked = if prev.is_null() {
                    self.head
                        .compare_exchange(curr, next, Ordering::Release, Ordering::Acquire, &guard)
                        .is_ok()
                } else {
                    // SAFETY: prev is hazard-protected
                    unsafe { &(*prev).next }
                        .compare_exchange(curr, next, Ordering::Release, Ordering::Acquire, &guard)
                        .is_ok()
                };
                if unlinked {
                    // SAFETY: the CAS above took the node off the chain
                    unsafe { retire_node(curr.as_raw(), self.finalizer.clone()) };
                    // Re-protect the successor through the link just updated.
                    let link = if prev.is_null() {
                        &self.head
                    } else {
                        // SAFETY: prev is hazard-protected
                        unsafe { &(*prev).next }
                    };
                    curr = link.protect(curr_slot, &guard);
                    continue;
                }
            }

            prev = curr.as_raw();
            curr_slot = 1 - curr_slot;
            curr = curr_ref.next.protect(curr_slot, &guard);
        }

        drop(guard);
        self.reclaim_busy.store(false, Ordering::Release);

        // Freeing is guarded by the hazard re-scan inside collect, not by
        // the snapshot cells; those only decided which tombstones were
        // eligible to unlink above.
        collect();
    }
}
