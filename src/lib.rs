//! Zincir: hazard-slot memory reclamation for lock-free data structures.
//!
//! Zincir protects in-flight references with a fixed table of participant
//! slot groups. A participant (an in-flight operation, iterator, or
//! transaction) leases a group with [`pin`], publishes the pointers it is
//! about to dereference into the group's two hazard cells, and optionally
//! publishes the snapshot version it still reads into the group's
//! active-snapshot cell. Unlinked nodes are [`retire`]d to a thread-local
//! list and freed by [`collect`] once no hazard cell publishes them.
//!
//! # Example
//!
//! ```rust,ignore
//! use zincir::{pin, Atomic, Ordering};
//!
//! let atomic = Atomic::new(Box::into_raw(Box::new(42)));
//!
//! let guard = pin();
//!
//! // Publish into hazard cell 0 and validate.
//! let ptr = atomic.protect(0, &guard);
//!
//! if let Some(value) = unsafe { ptr.as_ref() } {
//!     println!("value: {}", value);
//! }
//!
//! drop(guard);
//! ```

#![warn(missing_docs)]

mod atomic;
mod guard;
mod registry;
mod retired;

pub use atomic::{Atomic, Shared};
pub use guard::{pin, try_pin, Guard};
pub use registry::{min_active_snapshot, MAX_PARTICIPANTS, SLOTS_PER_PARTICIPANT};
pub use retired::{collect, retire};

// Re-export for convenience
pub use core::sync::atomic::Ordering;
