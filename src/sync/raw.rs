//! Raw lock traits: the bound [`Guarded`](super::Guarded) takes its lock
//! parameter under.

use std::time::Duration;

use crate::time::Deadline;

/// A reader-writer lock usable as the lock parameter of
/// [`Guarded`](super::Guarded).
///
/// Contention is expressed by blocking or by a `false` return from the try
/// paths, never as an error. Releasing a mode that is not held is a contract
/// violation: it corrupts the lock's counters (it cannot by itself cause
/// memory unsafety, but a wrapper deriving aliasing guarantees from the lock
/// will misbehave).
///
/// # Safety
///
/// An implementation must provide genuine mutual exclusion: at most one
/// exclusive holder at any instant, and never an exclusive holder concurrent
/// with a shared holder. A successful exclusive acquire must synchronize
/// with every prior release; a successful shared acquire must synchronize
/// with the prior exclusive release. [`Guarded`](super::Guarded) hands out
/// `&mut T` on the strength of these promises.
pub unsafe trait RawSharedLock {
    /// Acquires exclusive ownership, blocking until granted.
    fn lock(&self);

    /// Attempts exclusive ownership without blocking.
    fn try_lock(&self) -> bool;

    /// Releases exclusive ownership.
    fn unlock(&self);

    /// Acquires shared ownership, blocking while any writer demands the lock.
    fn lock_shared(&self);

    /// Attempts shared ownership without blocking.
    fn try_lock_shared(&self) -> bool;

    /// Releases one shared hold.
    fn unlock_shared(&self);
}

/// A [`RawSharedLock`] with bounded-wait acquisition.
///
/// # Safety
///
/// Same contract as [`RawSharedLock`]; a `true` return from any timed path
/// grants the corresponding mode.
pub unsafe trait RawSharedTimedLock: RawSharedLock {
    /// Attempts exclusive ownership, giving up after `timeout`.
    fn try_lock_for(&self, timeout: Duration) -> bool;

    /// Attempts exclusive ownership, giving up at `deadline`.
    fn try_lock_until(&self, deadline: Deadline) -> bool;

    /// Attempts shared ownership, giving up after `timeout`.
    fn try_lock_shared_for(&self, timeout: Duration) -> bool;

    /// Attempts shared ownership, giving up at `deadline`.
    fn try_lock_shared_until(&self, deadline: Deadline) -> bool;
}
