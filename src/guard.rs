//! Participant guards.
//!
//! A [`Guard`] is a leased slot group: while it exists, pointers published
//! into its hazard cells are protected from reclamation and a version
//! published into its snapshot cell pins reclamation at or below it.

use crate::registry::{self, SlotGroup, MAX_PARTICIPANTS};
use core::sync::atomic::Ordering;
use crossbeam_utils::CachePadded;

/// RAII lease of one participant slot group.
///
/// Dropping the guard clears every cell it owns and returns the group to
/// the free pool.
pub struct Guard {
    group: &'static CachePadded<SlotGroup>,
    index: usize,
}

impl Guard {
    /// Publish `ptr` into hazard cell `slot`.
    #[inline]
    pub(crate) fn publish(&self, slot: usize, ptr: usize) {
        self.group.hazards[slot].store(ptr, Ordering::Release);
    }

    /// Publish a snapshot version, pinning reclamation at or below it.
    ///
    /// Version 0 means "no snapshot" and is equivalent to
    /// [`clear_snapshot`](Guard::clear_snapshot).
    #[inline]
    pub fn set_snapshot(&self, version: u64) {
        self.group.snapshot.store(version, Ordering::Release);
    }

    /// Withdraw the published snapshot version.
    #[inline]
    pub fn clear_snapshot(&self) {
        self.group.snapshot.store(0, Ordering::Release);
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        for cell in &self.group.hazards {
            cell.store(0, Ordering::Release);
        }
        self.group.snapshot.store(0, Ordering::Release);
        registry::global().release(self.index);
    }
}

/// Lease a participant slot group.
///
/// Returns `None` when all [`MAX_PARTICIPANTS`] groups are claimed.
#[inline]
pub fn try_pin() -> Option<Guard> {
    let registry = registry::global();
    let index = registry.claim()?;
    Some(Guard {
        group: registry.group(index),
        index,
    })
}

/// Lease a participant slot group.
///
/// While the guard exists, pointers published into its hazard cells stay
/// valid; dropping it releases the group.
///
/// # Examples
///
/// ```rust,ignore
/// use zincir::pin;
///
/// let guard = pin();
/// // Access lock-free data structures safely
/// drop(guard);
/// ```
///
/// # Panics
///
/// Panics when all groups are claimed. That many simultaneously live guards
/// is a configuration error; raise the capacity via the `participants-*`
/// cargo features.
#[inline]
pub fn pin() -> Guard {
    match try_pin() {
        Some(guard) => guard,
        None => panic!("zincir: exceeded maximum participant count ({MAX_PARTICIPANTS})"),
    }
}
