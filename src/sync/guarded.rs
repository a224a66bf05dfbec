//! A value-and-lock pairing with scoped access handles.
//!
//! [`Guarded`] owns one value and one lock; every access goes through a
//! guard that holds the matching lock mode for exactly its own lifetime.
//! Binding ownership of the lock to the guard's lifetime ensures the lock is
//! released on every exit path, including failure paths in the caller, and
//! the borrow the guard takes on the wrapper lets the compiler enforce the
//! lifetime contract a raw back-pointer could only document.

use std::cell::UnsafeCell;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

use crate::time::Deadline;

use super::raw::{RawSharedLock, RawSharedTimedLock};
use super::shared_mutex::SharedTimedMutex;

/// A value protected by a shared mutex.
///
/// Access requires a guard: [`ExclusiveGuard`] (unique, mutable),
/// [`ExclusiveReadGuard`] (unique, read-only), or [`SharedReadGuard`]
/// (shared, read-only, cloneable). Dropping the guard releases exactly the
/// mode it holds.
///
/// The lock type is a parameter; the timed operations exist only when it
/// implements [`RawSharedTimedLock`]. The blocking operations return a guard
/// directly, the `try_*` operations return `None` exactly when the
/// underlying lock's try path failed.
///
/// # Example
///
/// ```
/// use futexsync::Guarded;
///
/// let counter: Guarded<_> = Guarded::new(0_u64);
/// *counter.lock() += 1;
///
/// let read = counter.lock_shared();
/// assert_eq!(*read, 1);
/// // Shared holders stack; the writer path is refused meanwhile.
/// assert!(counter.try_lock().is_none());
/// drop(read);
/// assert!(counter.try_lock().is_some());
/// ```
pub struct Guarded<T, M = SharedTimedMutex> {
    mutex: M,
    value: UnsafeCell<T>,
}

// Shared guards hand out `&T` to several threads at once, so `T: Sync` is
// required in addition to the `T: Send` that exclusive access implies.
unsafe impl<T: Send, M: Send> Send for Guarded<T, M> {}
unsafe impl<T: Send + Sync, M: Sync> Sync for Guarded<T, M> {}

impl<T, M: RawSharedLock + Default> Guarded<T, M> {
    /// Wraps `value` behind a fresh, unlocked mutex.
    pub fn new(value: T) -> Self {
        Self {
            mutex: M::default(),
            value: UnsafeCell::new(value),
        }
    }
}

impl<T: Default, M: RawSharedLock + Default> Default for Guarded<T, M> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T, M> Guarded<T, M> {
    /// Consumes the wrapper and returns the value. No locking is needed:
    /// ownership proves no guard exists.
    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    /// Returns a mutable reference to the value. No locking is needed: the
    /// unique borrow proves no guard exists.
    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }
}

impl<T, M: RawSharedLock> Guarded<T, M> {
    // ── Exclusive mutable ─────────────────────────────────────────────────

    /// Locks in exclusive mode and returns a mutable guard.
    pub fn lock(&self) -> ExclusiveGuard<'_, T, M> {
        self.mutex.lock();
        ExclusiveGuard { guarded: self }
    }

    /// Attempts the exclusive lock without blocking.
    pub fn try_lock(&self) -> Option<ExclusiveGuard<'_, T, M>> {
        self.mutex.try_lock().then(|| ExclusiveGuard { guarded: self })
    }

    // ── Exclusive read-only ───────────────────────────────────────────────

    /// Locks in exclusive mode and returns a read-only guard.
    ///
    /// The lock mode is identical to [`lock`](Self::lock); only the view
    /// into the value narrows.
    pub fn lock_read(&self) -> ExclusiveReadGuard<'_, T, M> {
        self.mutex.lock();
        ExclusiveReadGuard { guarded: self }
    }

    /// Attempts the exclusive lock without blocking, yielding a read-only
    /// guard.
    pub fn try_lock_read(&self) -> Option<ExclusiveReadGuard<'_, T, M>> {
        self.mutex
            .try_lock()
            .then(|| ExclusiveReadGuard { guarded: self })
    }

    // ── Shared read-only ──────────────────────────────────────────────────

    /// Locks in shared mode and returns a cloneable read-only guard.
    pub fn lock_shared(&self) -> SharedReadGuard<'_, T, M> {
        self.mutex.lock_shared();
        SharedReadGuard { guarded: self }
    }

    /// Attempts the shared lock without blocking.
    pub fn try_lock_shared(&self) -> Option<SharedReadGuard<'_, T, M>> {
        self.mutex
            .try_lock_shared()
            .then(|| SharedReadGuard { guarded: self })
    }
}

impl<T, M: RawSharedTimedLock> Guarded<T, M> {
    /// As [`lock`](Self::lock), giving up after `timeout`.
    pub fn try_lock_for(&self, timeout: Duration) -> Option<ExclusiveGuard<'_, T, M>> {
        self.mutex
            .try_lock_for(timeout)
            .then(|| ExclusiveGuard { guarded: self })
    }

    /// As [`lock`](Self::lock), giving up at `deadline`.
    pub fn try_lock_until(&self, deadline: impl Into<Deadline>) -> Option<ExclusiveGuard<'_, T, M>> {
        self.mutex
            .try_lock_until(deadline.into())
            .then(|| ExclusiveGuard { guarded: self })
    }

    /// As [`lock_read`](Self::lock_read), giving up after `timeout`.
    pub fn try_lock_read_for(&self, timeout: Duration) -> Option<ExclusiveReadGuard<'_, T, M>> {
        self.mutex
            .try_lock_for(timeout)
            .then(|| ExclusiveReadGuard { guarded: self })
    }

    /// As [`lock_read`](Self::lock_read), giving up at `deadline`.
    pub fn try_lock_read_until(
        &self,
        deadline: impl Into<Deadline>,
    ) -> Option<ExclusiveReadGuard<'_, T, M>> {
        self.mutex
            .try_lock_until(deadline.into())
            .then(|| ExclusiveReadGuard { guarded: self })
    }

    /// As [`lock_shared`](Self::lock_shared), giving up after `timeout`.
    pub fn try_lock_shared_for(&self, timeout: Duration) -> Option<SharedReadGuard<'_, T, M>> {
        self.mutex
            .try_lock_shared_for(timeout)
            .then(|| SharedReadGuard { guarded: self })
    }

    /// As [`lock_shared`](Self::lock_shared), giving up at `deadline`.
    pub fn try_lock_shared_until(
        &self,
        deadline: impl Into<Deadline>,
    ) -> Option<SharedReadGuard<'_, T, M>> {
        self.mutex
            .try_lock_shared_until(deadline.into())
            .then(|| SharedReadGuard { guarded: self })
    }
}

impl<T: fmt::Debug, M: RawSharedLock> fmt::Debug for Guarded<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Guarded");
        match self.try_lock_shared() {
            Some(guard) => s.field("value", &&*guard),
            None => s.field("value", &format_args!("<locked>")),
        };
        s.finish()
    }
}

/// Exclusive mutable handle. At most one exists per wrapper at any instant.
#[must_use = "the exclusive hold is released immediately if the guard is not bound"]
pub struct ExclusiveGuard<'a, T, M: RawSharedLock> {
    guarded: &'a Guarded<T, M>,
}

impl<'a, T, M: RawSharedLock> ExclusiveGuard<'a, T, M> {
    /// Narrows this guard to a read-only view of the same exclusive hold.
    ///
    /// This is not a relocking event: the lock mode carries over unchanged.
    pub fn into_read(self) -> ExclusiveReadGuard<'a, T, M> {
        let guarded = self.guarded;
        mem::forget(self);
        ExclusiveReadGuard { guarded }
    }
}

impl<T, M: RawSharedLock> Deref for ExclusiveGuard<'_, T, M> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, M: RawSharedLock> DerefMut for ExclusiveGuard<'_, T, M> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.guarded.value.get() }
    }
}

impl<T, M: RawSharedLock> Drop for ExclusiveGuard<'_, T, M> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.mutex.unlock();
    }
}

impl<T: fmt::Debug, M: RawSharedLock> fmt::Debug for ExclusiveGuard<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveGuard").field("value", &&**self).finish()
    }
}

impl<'a, T, M: RawSharedLock> From<ExclusiveGuard<'a, T, M>> for ExclusiveReadGuard<'a, T, M> {
    fn from(guard: ExclusiveGuard<'a, T, M>) -> Self {
        guard.into_read()
    }
}

/// Exclusive read-only handle: the same lock mode as [`ExclusiveGuard`] with
/// a narrowed view. Obtained from [`Guarded::lock_read`] or by widening an
/// [`ExclusiveGuard`].
#[must_use = "the exclusive hold is released immediately if the guard is not bound"]
pub struct ExclusiveReadGuard<'a, T, M: RawSharedLock> {
    guarded: &'a Guarded<T, M>,
}

impl<T, M: RawSharedLock> Deref for ExclusiveReadGuard<'_, T, M> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, M: RawSharedLock> Drop for ExclusiveReadGuard<'_, T, M> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.mutex.unlock();
    }
}

impl<T: fmt::Debug, M: RawSharedLock> fmt::Debug for ExclusiveReadGuard<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusiveReadGuard")
            .field("value", &&**self)
            .finish()
    }
}

/// Shared read-only handle. Any number may exist at once; cloning acquires
/// an additional shared hold on the same lock, blocking on writer demand
/// like any other shared acquisition.
#[must_use = "the shared hold is released immediately if the guard is not bound"]
pub struct SharedReadGuard<'a, T, M: RawSharedLock> {
    guarded: &'a Guarded<T, M>,
}

impl<T, M: RawSharedLock> Deref for SharedReadGuard<'_, T, M> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.guarded.value.get() }
    }
}

impl<T, M: RawSharedLock> Clone for SharedReadGuard<'_, T, M> {
    fn clone(&self) -> Self {
        self.guarded.mutex.lock_shared();
        Self {
            guarded: self.guarded,
        }
    }
}

impl<T, M: RawSharedLock> Drop for SharedReadGuard<'_, T, M> {
    #[inline]
    fn drop(&mut self) {
        self.guarded.mutex.unlock_shared();
    }
}

impl<T: fmt::Debug, M: RawSharedLock> fmt::Debug for SharedReadGuard<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedReadGuard")
            .field("value", &&**self)
            .finish()
    }
}
