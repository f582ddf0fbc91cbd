//! Atomic pointer types with hazard protection.
//!
//! [`Atomic<T>`] is a typed atomic pointer; [`Shared<'g, T>`] is a pointer
//! loaded from one, bound to the lifetime of the [`Guard`] it was loaded
//! under. A plain [`load`](Atomic::load) is a single atomic read and carries
//! no protection; [`protect`](Atomic::protect) additionally publishes the
//! pointer into one of the guard's hazard cells so it survives concurrent
//! reclamation.

use crate::guard::Guard;
use core::marker::PhantomData;
use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A pointer to a heap-allocated value with atomic operations.
pub struct Atomic<T> {
    data: AtomicUsize,
    _marker: PhantomData<*mut T>,
}

unsafe impl<T: Send + Sync> Send for Atomic<T> {}
unsafe impl<T: Send + Sync> Sync for Atomic<T> {}

impl<T> Atomic<T> {
    /// Creates a new atomic pointer.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use zincir::Atomic;
    ///
    /// let atomic = Atomic::new(Box::into_raw(Box::new(42)));
    /// ```
    #[inline]
    pub fn new(ptr: *mut T) -> Self {
        Self {
            data: AtomicUsize::new(ptr as usize),
            _marker: PhantomData,
        }
    }

    /// Creates a null atomic pointer.
    #[inline]
    pub fn null() -> Self {
        Self::new(ptr::null_mut())
    }

    /// Loads the pointer. A single atomic read; the result is not protected
    /// from reclamation.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use zincir::{pin, Atomic, Ordering};
    ///
    /// let atomic = Atomic::new(Box::into_raw(Box::new(42)));
    /// let guard = pin();
    /// let ptr = atomic.load(Ordering::Acquire, &guard);
    /// ```
    #[inline]
    pub fn load<'g>(&self, order: Ordering, _guard: &'g Guard) -> Shared<'g, T> {
        let raw = self.data.load(order);
        Shared {
            data: raw as *mut T,
            _marker: PhantomData,
        }
    }

    /// Loads the pointer and publishes it into hazard cell `slot` of
    /// `guard`, retrying until the published value is validated against a
    /// re-read.
    ///
    /// On return the pointee (if non-null) will not be reclaimed while the
    /// cell still publishes it.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use zincir::{pin, Atomic};
    ///
    /// let atomic = Atomic::new(Box::into_raw(Box::new(42)));
    /// let guard = pin();
    ///
    /// // Published into cell 0; safe to dereference until republished
    /// // or the guard drops.
    /// let ptr = atomic.protect(0, &guard);
    /// if let Some(value) = unsafe { ptr.as_ref() } {
    ///     assert_eq!(*value, 42);
    /// }
    /// ```
    #[inline]
    pub fn protect<'g>(&self, slot: usize, guard: &'g Guard) -> Shared<'g, T> {
        loop {
            let raw = self.data.load(Ordering::Acquire);
            guard.publish(slot, raw);
            if self.data.load(Ordering::Acquire) == raw {
                return Shared {
                    data: raw as *mut T,
                    _marker: PhantomData,
                };
            }
            core::hint::spin_loop();
        }
    }

    /// Stores a pointer.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use zincir::{Atomic, Ordering, Shared};
    ///
    /// let atomic = Atomic::null();
    /// let ptr = Box::into_raw(Box::new(42));
    /// atomic.store(unsafe { Shared::from_raw(ptr) }, Ordering::Release);
    /// ```
    #[inline]
    pub fn store(&self, ptr: Shared<'_, T>, order: Ordering) {
        self.data.store(ptr.data as usize, order);
    }

    /// Compares and exchanges the pointer.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use zincir::{pin, Atomic, Ordering, Shared};
    ///
    /// let atomic = Atomic::new(Box::into_raw(Box::new(42)));
    /// let guard = pin();
    /// let current = atomic.protect(0, &guard);
    /// let new = Box::into_raw(Box::new(43));
    /// atomic
    ///     .compare_exchange(
    ///         current,
    ///         unsafe { Shared::from_raw(new) },
    ///         Ordering::Release,
    ///         Ordering::Acquire,
    ///         &guard,
    ///     )
    ///     .unwrap();
    /// ```
    #[inline]
    pub fn compare_exchange<'g>(
        &self,
        current: Shared<'_, T>,
        new: Shared<'_, T>,
        success: Ordering,
        failure: Ordering,
        _guard: &'g Guard,
    ) -> Result<Shared<'g, T>, Shared<'g, T>> {
        match self
            .data
            .compare_exchange(current.data as usize, new.data as usize, success, failure)
        {
            Ok(prev) => Ok(Shared {
                data: prev as *mut T,
                _marker: PhantomData,
            }),
            Err(prev) => Err(Shared {
                data: prev as *mut T,
                _marker: PhantomData,
            }),
        }
    }

    /// Compares and exchanges the pointer (weak version).
    ///
    /// May spuriously fail even when the comparison succeeds.
    #[inline]
    pub fn compare_exchange_weak<'g>(
        &self,
        current: Shared<'_, T>,
        new: Shared<'_, T>,
        success: Ordering,
        failure: Ordering,
        _guard: &'g Guard,
    ) -> Result<Shared<'g, T>, Shared<'g, T>> {
        match self.data.compare_exchange_weak(
            current.data as usize,
            new.data as usize,
            success,
            failure,
        ) {
            Ok(prev) => Ok(Shared {
                data: prev as *mut T,
                _marker: PhantomData,
            }),
            Err(prev) => Err(Shared {
                data: prev as *mut T,
                _marker: PhantomData,
            }),
        }
    }

    /// Returns the raw pointer through exclusive access, without atomics.
    #[inline]
    pub fn get_mut(&mut self) -> *mut T {
        *self.data.get_mut() as *mut T
    }
}

impl<T> Default for Atomic<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// A pointer loaded from an [`Atomic`], bound to a guard lifetime.
///
/// # Safety
///
/// Unless obtained from [`Atomic::protect`], the pointee may be reclaimed
/// at any time; dereferencing is only sound while a hazard cell or other
/// ownership argument keeps it alive.
pub struct Shared<'g, T> {
    data: *mut T,
    _marker: PhantomData<(&'g Guard, *mut T)>,
}

impl<'g, T> Shared<'g, T> {
    /// Creates a shared pointer from a raw pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure the pointer remains valid for as long as the
    /// result is dereferenced.
    #[inline]
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            data: ptr,
            _marker: PhantomData,
        }
    }

    /// The null shared pointer.
    #[inline]
    pub fn null() -> Self {
        Self {
            data: ptr::null_mut(),
            _marker: PhantomData,
        }
    }

    /// Returns the raw pointer.
    #[inline]
    pub fn as_raw(&self) -> *mut T {
        self.data
    }

    /// Returns true if the pointer is null.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.data.is_null()
    }

    /// Converts to an optional reference.
    ///
    /// # Safety
    ///
    /// The caller must ensure the pointer is properly aligned and points to
    /// a valid, still-live value of type `T`.
    #[inline]
    pub unsafe fn as_ref(&self) -> Option<&'g T> {
        if self.is_null() {
            None
        } else {
            // SAFETY: caller guarantees pointer validity
            unsafe { Some(&*self.data) }
        }
    }

    /// Converts to a reference without checking for null.
    ///
    /// # Safety
    ///
    /// The pointer must be non-null and point to a valid, still-live value.
    #[inline]
    pub unsafe fn deref(&self) -> &'g T {
        // SAFETY: caller guarantees pointer is non-null and valid
        unsafe { &*self.data }
    }
}

impl<'g, T> Clone for Shared<'g, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'g, T> Copy for Shared<'g, T> {}

impl<'g, T> PartialEq for Shared<'g, T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<'g, T> Eq for Shared<'g, T> {}

impl<'g, T> core::fmt::Debug for Shared<'g, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Shared({:p})", self.data)
    }
}
