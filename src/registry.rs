//! Participant slot registry.
//!
//! A fixed table of slot groups, one per active participant (an in-flight
//! operation, iterator, or transaction). Each group carries two hazard cells
//! (predecessor and current node during a traversal) and one active-snapshot
//! cell publishing the oldest version the participant still reads.

use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use once_cell::race::OnceBox;

/// Hazard cells per participant: one for the predecessor, one for the
/// current node of a traversal.
pub const SLOTS_PER_PARTICIPANT: usize = 2;

// Configurable via cargo features:
//   zincir = { features = ["participants-128"] }
// Default: 32.
/// Maximum concurrent participants.
#[cfg(feature = "participants-128")]
pub const MAX_PARTICIPANTS: usize = 128;
/// Maximum concurrent participants.
#[cfg(all(feature = "participants-64", not(feature = "participants-128")))]
pub const MAX_PARTICIPANTS: usize = 64;
/// Maximum concurrent participants.
#[cfg(not(any(feature = "participants-64", feature = "participants-128")))]
pub const MAX_PARTICIPANTS: usize = 32;

const FREE_WORDS: usize = (MAX_PARTICIPANTS + 63) / 64;

/// Per-participant slot group.
pub(crate) struct SlotGroup {
    /// Published pointers. 0 = nothing protected.
    pub(crate) hazards: [AtomicUsize; SLOTS_PER_PARTICIPANT],
    /// Published snapshot version. 0 = no snapshot pinned.
    pub(crate) snapshot: AtomicU64,
}

impl SlotGroup {
    fn new() -> Self {
        Self {
            hazards: [AtomicUsize::new(0), AtomicUsize::new(0)],
            snapshot: AtomicU64::new(0),
        }
    }
}

/// Global registry state.
pub(crate) struct Registry {
    slots: &'static [CachePadded<SlotGroup>],
    /// Bitmap of free group indices; a set bit means the index is claimable.
    free: [AtomicU64; FREE_WORDS],
}

impl Registry {
    fn new() -> Self {
        let mut groups = Vec::with_capacity(MAX_PARTICIPANTS);
        for _ in 0..MAX_PARTICIPANTS {
            groups.push(CachePadded::new(SlotGroup::new()));
        }

        let free = core::array::from_fn(|w| {
            let base = w * 64;
            let mut bits = 0u64;
            for b in 0..64 {
                if base + b < MAX_PARTICIPANTS {
                    bits |= 1 << b;
                }
            }
            AtomicU64::new(bits)
        });

        Self {
            slots: Box::leak(groups.into_boxed_slice()),
            free,
        }
    }

    #[inline]
    pub(crate) fn group(&self, index: usize) -> &'static CachePadded<SlotGroup> {
        &self.slots[index]
    }

    /// Claim a free group index, or `None` when the table is exhausted.
    pub(crate) fn claim(&self) -> Option<usize> {
        for (w, word) in self.free.iter().enumerate() {
            let mut bits = word.load(Ordering::Acquire);
            while bits != 0 {
                let bit = bits.trailing_zeros() as u64;
                match word.compare_exchange_weak(
                    bits,
                    bits & !(1 << bit),
                    Ordering::Acquire,
                    Ordering::Acquire,
                ) {
                    Ok(_) => return Some(w * 64 + bit as usize),
                    Err(actual) => bits = actual,
                }
            }
        }
        None
    }

    /// Return a group index to the free pool. The caller must have cleared
    /// the group's cells first.
    pub(crate) fn release(&self, index: usize) {
        let (w, b) = (index / 64, index % 64);
        self.free[w].fetch_or(1 << b, Ordering::Release);
    }

    /// True if any hazard cell currently publishes `ptr`.
    pub(crate) fn is_hazardous(&self, ptr: usize) -> bool {
        for group in self.slots {
            for cell in &group.hazards {
                if cell.load(Ordering::Acquire) == ptr {
                    return true;
                }
            }
        }
        false
    }

    fn min_snapshot(&self) -> u64 {
        let mut min = u64::MAX;
        for group in self.slots {
            let v = group.snapshot.load(Ordering::Acquire);
            if v != 0 && v < min {
                min = v;
            }
        }
        min
    }
}

static GLOBAL: OnceBox<Registry> = OnceBox::new();

#[inline]
pub(crate) fn global() -> &'static Registry {
    GLOBAL.get_or_init(|| Box::new(Registry::new()))
}

/// Minimum snapshot version published by any participant, or `u64::MAX` when
/// none is pinned.
///
/// Not a linearizable read: a snapshot published concurrently with the scan
/// may be missed, but such a snapshot was taken at or after the clock value
/// the caller pairs this with, so anything reclaimed against the returned
/// minimum was already invisible to it.
pub fn min_active_snapshot() -> u64 {
    global().min_snapshot()
}
