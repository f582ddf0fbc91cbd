//! Thread-local retire lists.
//!
//! An unlinked node is not freed immediately: it is pushed onto the retiring
//! thread's list together with a type-erased reclaim closure, and freed by a
//! later [`collect`] pass once no hazard cell publishes its address.

use crate::registry;
use core::cell::RefCell;

/// Retire-list length that triggers an automatic collect pass.
const COLLECT_THRESHOLD: usize = 256;

/// A node awaiting its final free.
struct Retired {
    /// Address compared against the hazard cells.
    ptr: usize,
    /// Frees the node (and runs any finalizer) when invoked.
    reclaim: Box<dyn FnOnce()>,
}

struct Handle {
    batch: RefCell<Vec<Retired>>,
}

impl Handle {
    fn new() -> Self {
        Self {
            batch: RefCell::new(Vec::new()),
        }
    }

    fn retire(&self, ptr: usize, reclaim: Box<dyn FnOnce()>) {
        let mut batch = self.batch.borrow_mut();
        batch.push(Retired { ptr, reclaim });
        if batch.len() >= COLLECT_THRESHOLD {
            drop(batch);
            self.collect();
        }
    }

    fn collect(&self) {
        let entries = {
            let mut batch = self.batch.borrow_mut();
            if batch.is_empty() {
                return;
            }
            core::mem::take(&mut *batch)
        };

        let registry = registry::global();
        let mut kept = Vec::new();
        for entry in entries {
            if registry.is_hazardous(entry.ptr) {
                kept.push(entry);
            } else {
                (entry.reclaim)();
            }
        }

        if !kept.is_empty() {
            self.batch.borrow_mut().append(&mut kept);
        }
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        // Final best-effort pass at thread exit. Entries a hazard cell still
        // publishes are leaked rather than risk a use-after-free.
        let entries = core::mem::take(&mut *self.batch.borrow_mut());
        let registry = registry::global();
        for entry in entries {
            if registry.is_hazardous(entry.ptr) {
                core::mem::forget(entry.reclaim);
            } else {
                (entry.reclaim)();
            }
        }
    }
}

std::thread_local! {
    static HANDLE: Handle = Handle::new();
}

/// Retire a node for later reclamation.
///
/// `reclaim` runs on the retiring thread during some future [`collect`]
/// pass, once no hazard cell publishes `ptr`.
///
/// # Safety
///
/// `ptr` must point to a valid allocation that is no longer reachable from
/// the data structure; `reclaim` must be the only thing that frees it.
pub unsafe fn retire<T>(ptr: *mut T, reclaim: impl FnOnce() + 'static) {
    HANDLE.with(|h| h.retire(ptr as usize, Box::new(reclaim)));
}

/// Run a reclamation pass over the calling thread's retire list.
///
/// Frees every retired node no hazard cell publishes; the rest stay for a
/// later pass.
pub fn collect() {
    HANDLE.with(|h| h.collect());
}
