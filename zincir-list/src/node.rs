//! Versioned chain nodes.

use core::sync::atomic::{AtomicU64, Ordering};
use zincir::Atomic;

/// One link of the chain: the caller's element handle plus the version pair
/// that decides its visibility.
pub(crate) struct Node<E> {
    pub(crate) elm: E,
    /// Version assigned when the node was first linked. Immutable.
    pub(crate) insert_version: u64,
    /// 0 while live; the tombstoning version afterwards. Written once.
    pub(crate) removed_version: AtomicU64,
    pub(crate) next: Atomic<Node<E>>,
}

impl<E> Node<E> {
    pub(crate) fn alloc(elm: E, insert_version: u64) -> *mut Self {
        Box::into_raw(Box::new(Self {
            elm,
            insert_version,
            removed_version: AtomicU64::new(0),
            next: Atomic::null(),
        }))
    }

    /// Visible at snapshot `s`: inserted at or before `s`, and either live
    /// or removed strictly after `s`.
    #[inline]
    pub(crate) fn visible_at(&self, s: u64) -> bool {
        let removed = self.removed_version.load(Ordering::Acquire);
        self.insert_version <= s && (removed == 0 || removed > s)
    }

    /// Tombstone at version `v`. Returns false when the node was already
    /// tombstoned; the stored version never changes after the first store.
    #[inline]
    pub(crate) fn tombstone(&self, v: u64) -> bool {
        self.removed_version
            .compare_exchange(0, v, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_window() {
        let raw = Node::alloc(7usize, 3);
        let node = unsafe { &*raw };

        assert!(!node.visible_at(2));
        assert!(node.visible_at(3));
        assert!(node.visible_at(100));

        assert!(node.tombstone(5));
        assert!(node.visible_at(4));
        assert!(!node.visible_at(5));

        // Double tombstone keeps the original version.
        assert!(!node.tombstone(9));
        assert!(node.visible_at(4));
        assert!(!node.visible_at(5));

        drop(unsafe { Box::from_raw(raw) });
    }
}
