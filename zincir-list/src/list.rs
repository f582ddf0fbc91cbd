//! The lock-free list core.

use core::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossbeam_utils::Backoff;
use zincir::{pin, Atomic, Ordering, Shared};

use crate::clock::CommitClock;
use crate::iter::SnapshotIter;
use crate::node::Node;

pub(crate) type Finalizer<E> = Arc<dyn Fn(E) + Send + Sync>;

/// A concurrent, linearizable, singly-linked list with MVCC snapshots.
///
/// The list is an unordered bag with positional insert semantics: elements
/// go to the head, the tail, or after an anchor element. Removal tombstones
/// a node by version instead of unlinking it, so a reader pinned at an older
/// snapshot keeps seeing it; physical unlinking is deferred to
/// [`reclaim`](VersionedList::reclaim).
///
/// `E` is an opaque element handle: the list never interprets it, only
/// stores it, compares it by equality, and hands it back. Small ids or raw
/// addresses are the intended shape.
pub struct VersionedList<E> {
    pub(crate) head: Atomic<Node<E>>,
    pub(crate) clock: CommitClock,
    pub(crate) finalizer: Option<Finalizer<E>>,
    /// One reclaim pass at a time: two passes unlinking through each
    /// other's predecessors could retire a still-reachable node.
    pub(crate) reclaim_busy: AtomicBool,
}

unsafe impl<E: Send> Send for VersionedList<E> {}
unsafe impl<E: Send> Sync for VersionedList<E> {}

impl<E: Copy + Eq + Send + 'static> VersionedList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self {
            head: Atomic::null(),
            clock: CommitClock::new(),
            finalizer: None,
            reclaim_busy: AtomicBool::new(false),
        }
    }

    /// Creates an empty list with a finalizer, invoked exactly once per
    /// element when the node holding it is reclaimed.
    ///
    /// Elements handed back to the caller by
    /// [`remove_head`](VersionedList::remove_head) are not finalized; their
    /// ownership returned with them.
    pub fn with_finalizer(f: impl Fn(E) + Send + Sync + 'static) -> Self {
        Self {
            head: Atomic::null(),
            clock: CommitClock::new(),
            finalizer: Some(Arc::new(f)),
            reclaim_busy: AtomicBool::new(false),
        }
    }

    /// Inserts at the head of the list.
    pub fn insert_head(&self, elm: E) {
        let version = self.clock.next();
        let node = Node::alloc(elm, version);
        let guard = pin();
        let backoff = Backoff::new();
        loop {
            let head = self.head.load(Ordering::Acquire, &guard);
            // SAFETY: node is private until the CAS below publishes it
            unsafe { (*node).next.store(head, Ordering::Release) };
            let new = unsafe { Shared::from_raw(node) };
            match self
                .head
                .compare_exchange_weak(head, new, Ordering::Release, Ordering::Acquire, &guard)
            {
                Ok(_) => return,
                Err(_) => backoff.spin(),
            }
        }
    }

    /// Inserts at the tail of the list.
    ///
    /// Tombstones are traversed through: a logically removed node is still a
    /// valid chain link, so the physical tail is the linkage point even when
    /// it is no longer visible.
    pub fn insert_tail(&self, elm: E) {
        let version = self.clock.next();
        let node = Node::alloc(elm, version);
        let new = unsafe { Shared::from_raw(node) };
        let guard = pin();
        let backoff = Backoff::new();
        loop {
            let mut slot = 0;
            let mut curr = self.head.protect(slot, &guard);
            if curr.is_null() {
                match self.head.compare_exchange_weak(
                    Shared::null(),
                    new,
                    Ordering::Release,
                    Ordering::Acquire,
                    &guard,
                ) {
                    Ok(_) => return,
                    Err(_) => {
                        backoff.spin();
                        continue;
                    }
                }
            }
            loop {
                // SAFETY: curr is hazard-protected and non-null
                let curr_ref = unsafe { curr.deref() };
                let next = curr_ref.next.protect(1 - slot, &guard);
                if next.is_null() {
                    match curr_ref.next.compare_exchange(
                        Shared::null(),
                        new,
                        Ordering::Release,
                        Ordering::Acquire,
                        &guard,
                    ) {
                        Ok(_) => return,
                        // Lost to another tail insert; restart the walk.
                        Err(_) => break,
                    }
                }
                curr = next;
                slot = 1 - slot;
            }
            backoff.spin();
        }
    }

    /// Inserts `elm` directly after the first node holding `anchor` that is
    /// visible at the new element's version.
    ///
    /// Returns false (and discards nothing of the caller's: `elm` stays with
    /// them) when no such anchor exists.
    pub fn insert_after(&self, anchor: E, elm: E) -> bool {
        let version = self.clock.next();
        let snapshot = version;
        let node = Node::alloc(elm, version);
        let guard = pin();
        let backoff = Backoff::new();
        let mut slot = 0;
        let mut curr = self.head.protect(slot, &guard);
        loop {
            if curr.is_null() {
                // Anchor not in the list; the node was never published.
                // SAFETY: node is still private
                drop(unsafe { Box::from_raw(node) });
                return false;
            }
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            if curr_ref.elm == anchor && curr_ref.visible_at(snapshot) {
                loop {
                    let next = curr_ref.next.load(Ordering::Acquire, &guard);
                    // SAFETY: node is private until the CAS below publishes it
                    unsafe { (*node).next.store(next, Ordering::Release) };
                    let new = unsafe { Shared::from_raw(node) };
                    match curr_ref.next.compare_exchange_weak(
                        next,
                        new,
                        Ordering::Release,
                        Ordering::Acquire,
                        &guard,
                    ) {
                        Ok(_) => return true,
                        // Retry against the same anchor with a fresh next.
                        Err(_) => backoff.spin(),
                    }
                }
            }
            curr = curr_ref.next.protect(1 - slot, &guard);
            slot = 1 - slot;
        }
    }

    /// Unlinks and returns the first element visible at the current
    /// snapshot, or `None` when the list is logically empty (tombstones may
    /// remain physically linked).
    ///
    /// Ownership of the element returns to the caller; the finalizer does
    /// not run for it.
    pub fn remove_head(&self) -> Option<E> {
        let snapshot = self.clock.current();
        let guard = pin();
        let backoff = Backoff::new();
        'outer: loop {
            let head = self.head.protect(0, &guard);
            if head.is_null() {
                return None;
            }
            // SAFETY: head is hazard-protected and non-null
            let head_ref = unsafe { head.deref() };
            if head_ref.visible_at(snapshot) {
                let next = head_ref.next.load(Ordering::Acquire, &guard);
                if self
                    .head
                    .compare_exchange(head, next, Ordering::Release, Ordering::Acquire, &guard)
                    .is_ok()
                {
                    let elm = head_ref.elm;
                    // The node waits out any concurrent readers.
                    unsafe { retire_node::<E>(head.as_raw(), None) };
                    return Some(elm);
                }
                backoff.spin();
                continue 'outer;
            }
            // Head is a tombstone at this snapshot; unlink the first node
            // that is visible.
            let mut prev = head;
            let mut prev_slot = 0;
            let mut curr = head_ref.next.protect(1, &guard);
            loop {
                if curr.is_null() {
                    return None;
                }
                // SAFETY: curr is hazard-protected and non-null
                let curr_ref = unsafe { curr.deref() };
                if curr_ref.visible_at(snapshot) {
                    let next = curr_ref.next.load(Ordering::Acquire, &guard);
                    // SAFETY: prev is hazard-protected
                    let prev_ref = unsafe { prev.deref() };
                    if prev_ref
                        .next
                        .compare_exchange(curr, next, Ordering::Release, Ordering::Acquire, &guard)
                        .is_ok()
                    {
                        let elm = curr_ref.elm;
                        unsafe { retire_node::<E>(curr.as_raw(), None) };
                        return Some(elm);
                    }
                    backoff.spin();
                    continue 'outer;
                }
                prev = curr;
                prev_slot = 1 - prev_slot;
                curr = curr_ref.next.protect(1 - prev_slot, &guard);
            }
        }
    }

    /// Tombstones the first node holding `elm`.
    ///
    /// The node stays physically linked until a reclaim pass; a second
    /// remove of the same node is an idempotent no-op. Returns false when no
    /// node holds `elm`.
    pub fn remove(&self, elm: E) -> bool {
        let version = self.clock.next();
        let guard = pin();
        let mut slot = 0;
        let mut curr = self.head.protect(slot, &guard);
        loop {
            if curr.is_null() {
                return false;
            }
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            if curr_ref.elm == elm {
                curr_ref.tombstone(version);
                return true;
            }
            curr = curr_ref.next.protect(1 - slot, &guard);
            slot = 1 - slot;
        }
    }

    /// True if a node holding `elm` is visible at the current snapshot.
    pub fn contains(&self, elm: E) -> bool {
        let snapshot = self.clock.current();
        let guard = pin();
        let mut slot = 0;
        let mut curr = self.head.protect(slot, &guard);
        loop {
            if curr.is_null() {
                return false;
            }
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            if curr_ref.elm == elm && curr_ref.visible_at(snapshot) {
                return true;
            }
            curr = curr_ref.next.protect(1 - slot, &guard);
            slot = 1 - slot;
        }
    }

    /// The first element visible at the current snapshot.
    pub fn front(&self) -> Option<E> {
        let snapshot = self.clock.current();
        let guard = pin();
        let mut slot = 0;
        let mut curr = self.head.protect(slot, &guard);
        loop {
            if curr.is_null() {
                return None;
            }
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            if curr_ref.visible_at(snapshot) {
                return Some(curr_ref.elm);
            }
            curr = curr_ref.next.protect(1 - slot, &guard);
            slot = 1 - slot;
        }
    }

    /// Number of elements visible at the current snapshot.
    pub fn len(&self) -> usize {
        let snapshot = self.clock.current();
        let guard = pin();
        let mut count = 0;
        let mut slot = 0;
        let mut curr = self.head.protect(slot, &guard);
        loop {
            if curr.is_null() {
                return count;
            }
            // SAFETY: curr is hazard-protected and non-null
            let curr_ref = unsafe { curr.deref() };
            if curr_ref.visible_at(snapshot) {
                count += 1;
            }
            curr = curr_ref.next.protect(1 - slot, &guard);
            slot = 1 - slot;
        }
    }

    /// True when no element is visible at the current snapshot.
    pub fn is_empty(&self) -> bool {
        self.front().is_none()
    }

    /// An iterator pinned at the current snapshot.
    ///
    /// The iterator yields exactly the elements visible at the snapshot it
    /// was created with, regardless of concurrent mutations.
    pub fn iter(&self) -> SnapshotIter<'_, E> {
        SnapshotIter::new(self)
    }
}

impl<E: Copy + Eq + Send + 'static> Default for VersionedList<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Drop for VersionedList<E> {
    fn drop(&mut self) {
        // Exclusive access: no concurrent readers remain, nodes already
        // retired are off the chain and free themselves later.
        let mut curr = self.head.get_mut();
        while !curr.is_null() {
            // SAFETY: every node still on the chain is owned by it
            let mut node = unsafe { Box::from_raw(curr) };
            curr = node.next.get_mut();
            if let Some(cb) = &self.finalizer {
                cb(node.elm);
            }
        }
    }
}

/// Retire an unlinked node. The reclaim closure frees the node once no
/// hazard cell publishes it and runs `finalizer` on the element if set.
///
/// # Safety
///
/// `ptr` must be unlinked from the chain and not retired before.
pub(crate) unsafe fn retire_node<E: Send + 'static>(
    ptr: *mut Node<E>,
    finalizer: Option<Finalizer<E>>,
) {
    // SAFETY: forwarded contract; the closure runs exactly once
    unsafe {
        zincir::retire(ptr, move || {
            let node = unsafe { Box::from_raw(ptr) };
            if let Some(cb) = finalizer {
                cb(node.elm);
            }
        });
    }
}
