//! Writer-preferring shared mutex over two parking cells.
//!
//! The lock keeps two 32-bit counters:
//!
//! - `writer_demand`: threads currently acquiring or holding exclusive
//!   ownership. Incremented before any exclusive attempt, decremented when
//!   that attempt resolves (release or abort).
//! - `holding`: active shared holders, offset by the [`WRITING`] sentinel
//!   while an exclusive holder is granted.
//!
//! Writer preference is enforced at the reader entry: readers refuse to
//! increment `holding` whenever `writer_demand` is nonzero, and a
//! double-check after the increment closes the race where a writer raises
//! its demand between the reader's load and increment. Writers park on
//! `holding` (waiting for it to drain to zero), readers park on
//! `writer_demand` (waiting for the demand to vanish); separating the park
//! addresses keeps a writer wake from stampeding the readers and vice versa.
//!
//! # Fairness
//!
//! | Scenario                   | Behavior                                    |
//! |----------------------------|---------------------------------------------|
//! | No writer demand           | Readers enter immediately, in parallel      |
//! | Writer demanding           | New readers park until all demand retires   |
//! | Readers active + writer    | Writer parks until the holders drain        |
//! | Several writers            | One wins the grant CAS; no FIFO order       |
//!
//! Reader starvation under a sustained stream of writers is intentional.
//!
//! # Contract
//!
//! Releasing a mode that is not held corrupts the counters, and more than
//! `2^31 - 1` concurrent shared holders overflows into the sentinel bit.
//! Neither is signaled (debug builds assert); both are caller
//! responsibility, exactly as with the platform lock types.

use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::park::ParkCell;
use crate::time::Deadline;

use super::raw::{RawSharedLock, RawSharedTimedLock};

/// Sentinel added to `holding` while an exclusive holder is granted.
///
/// The grant is a single whole-word CAS of `holding` from `0` to `WRITING`,
/// so "writer granted" and "holders drained" are one atomic transition.
const WRITING: u32 = 1 << 31;

/// The two-counter lock state shared by [`SharedMutex`] and
/// [`SharedTimedMutex`].
#[derive(Debug)]
struct LockCore {
    writer_demand: ParkCell,
    holding: ParkCell,
}

impl LockCore {
    const fn new() -> Self {
        Self {
            writer_demand: ParkCell::new(0),
            holding: ParkCell::new(0),
        }
    }

    // ── Exclusive ─────────────────────────────────────────────────────────

    fn acquire_exclusive(&self) {
        self.writer_demand.fetch_add(1, Ordering::Acquire);
        loop {
            let held = self.exclusive_probe();
            if held == 0 {
                return;
            }
            self.holding.wait(held);
        }
    }

    fn try_acquire_exclusive(&self) -> bool {
        self.writer_demand.fetch_add(1, Ordering::Acquire);
        if self.exclusive_probe() == 0 {
            return true;
        }
        self.retire_writer_demand();
        false
    }

    fn acquire_exclusive_deadline(&self, deadline: Deadline) -> bool {
        self.writer_demand.fetch_add(1, Ordering::Acquire);
        loop {
            let held = self.exclusive_probe();
            if held == 0 {
                return true;
            }
            // The expiry check keeps a past deadline to a single probe and
            // bounds the loop even if the cell value keeps changing right
            // at the deadline.
            if deadline.has_passed() || !self.holding.wait_until(held, deadline) {
                self.retire_writer_demand();
                return false;
            }
        }
    }

    fn release_exclusive(&self) {
        let prev = self.holding.fetch_sub(WRITING, Ordering::Release);
        debug_assert!(
            prev & WRITING != 0,
            "exclusive release without exclusive hold"
        );
        if !self.retire_writer_demand() {
            // Demand remains: hand `holding == 0` to one parked writer.
            self.holding.notify_one();
        }
    }

    // ── Shared ────────────────────────────────────────────────────────────

    fn acquire_shared(&self) {
        loop {
            let demand = self.shared_probe();
            if demand == 0 {
                return;
            }
            self.writer_demand.wait(demand);
        }
    }

    fn try_acquire_shared(&self) -> bool {
        self.shared_probe() == 0
    }

    fn acquire_shared_deadline(&self, deadline: Deadline) -> bool {
        loop {
            let demand = self.shared_probe();
            if demand == 0 {
                return true;
            }
            if deadline.has_passed() || !self.writer_demand.wait_until(demand, deadline) {
                // Nothing to undo: the timeout strikes before or during the
                // park, before any increment of `holding`.
                return false;
            }
        }
    }

    fn release_shared(&self) {
        let prev = self.holding.fetch_sub(1, Ordering::Release);
        debug_assert!(
            prev != 0 && prev != WRITING,
            "shared release without shared hold"
        );
        if prev == 1 && self.writer_demand.load(Ordering::Acquire) > 0 {
            // Holders drained with writers demanding: one writer can now win
            // the grant CAS. Concurrent writers serialize through its retry.
            self.holding.notify_one();
        }
    }

    // ── Probes ────────────────────────────────────────────────────────────

    /// One exclusive grant attempt: CAS `holding` from free to [`WRITING`].
    /// Returns the observed holder count, zero meaning the grant succeeded.
    fn exclusive_probe(&self) -> u32 {
        match self
            .holding
            .compare_exchange(0, WRITING, Ordering::Acquire, Ordering::Acquire)
        {
            Ok(_) => 0,
            Err(observed) => observed,
        }
    }

    /// One writer-priority shared entry attempt. Returns the observed writer
    /// demand, zero meaning a shared hold was taken.
    ///
    /// The increment of `holding` may race a writer raising its demand; the
    /// re-read detects that and backs the hold out. `holding` can therefore
    /// transiently exceed [`WRITING`] while a granted writer runs, which is
    /// why releases subtract the sentinel instead of storing zero.
    fn shared_probe(&self) -> u32 {
        let mut demand = self.writer_demand.load(Ordering::Acquire);
        if demand == 0 {
            let prev = self.holding.fetch_add(1, Ordering::Acquire);
            debug_assert!((prev & !WRITING) < WRITING - 1, "shared holder overflow");
            demand = self.writer_demand.load(Ordering::Acquire);
            if demand > 0 {
                self.release_shared();
            }
        }
        demand
    }

    /// Retires one unit of writer demand. When the demand reaches zero every
    /// parked reader is woken; returns whether that happened.
    fn retire_writer_demand(&self) -> bool {
        if self.writer_demand.fetch_sub(1, Ordering::Release) == 1 {
            self.writer_demand.notify_all();
            return true;
        }
        false
    }
}

/// A writer-preferring reader-writer lock parked directly on the OS.
///
/// Any number of threads may hold the lock in shared mode, or exactly one in
/// exclusive mode. Once a writer begins acquiring, no new shared holds are
/// granted until every pending writer has held and released.
///
/// Locking and unlocking need not happen on the same thread: no holder
/// identity is recorded. No heap allocation occurs on any path.
///
/// For bounded-wait acquisition use [`SharedTimedMutex`].
///
/// # Example
///
/// ```
/// use futexsync::SharedMutex;
///
/// let mutex = SharedMutex::new();
/// mutex.lock_shared();
/// assert!(mutex.try_lock_shared());
/// assert!(!mutex.try_lock());
/// mutex.unlock_shared();
/// mutex.unlock_shared();
/// assert!(mutex.try_lock());
/// mutex.unlock();
/// ```
#[derive(Debug)]
pub struct SharedMutex {
    core: LockCore,
}

impl Default for SharedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedMutex {
    /// Creates an unlocked mutex.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            core: LockCore::new(),
        }
    }

    /// Acquires exclusive ownership, parking until granted.
    pub fn lock(&self) {
        self.core.acquire_exclusive();
    }

    /// Attempts exclusive ownership without parking.
    ///
    /// A `false` return does not distinguish a refusal due to active holders
    /// from one due to concurrent writer demand.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        self.core.try_acquire_exclusive()
    }

    /// Releases exclusive ownership.
    ///
    /// Calling this without holding the lock exclusively corrupts the lock
    /// state.
    pub fn unlock(&self) {
        self.core.release_exclusive();
    }

    /// Acquires shared ownership, parking while any writer demands the lock.
    ///
    /// At most `2^31 - 1` shared holds may exist at once.
    pub fn lock_shared(&self) {
        self.core.acquire_shared();
    }

    /// Attempts shared ownership without parking.
    #[must_use]
    pub fn try_lock_shared(&self) -> bool {
        self.core.try_acquire_shared()
    }

    /// Releases one shared hold.
    ///
    /// Calling this without holding the lock in shared mode corrupts the
    /// lock state.
    pub fn unlock_shared(&self) {
        self.core.release_shared();
    }
}

unsafe impl RawSharedLock for SharedMutex {
    fn lock(&self) {
        Self::lock(self);
    }
    fn try_lock(&self) -> bool {
        Self::try_lock(self)
    }
    fn unlock(&self) {
        Self::unlock(self);
    }
    fn lock_shared(&self) {
        Self::lock_shared(self);
    }
    fn try_lock_shared(&self) -> bool {
        Self::try_lock_shared(self)
    }
    fn unlock_shared(&self) {
        Self::unlock_shared(self);
    }
}

/// [`SharedMutex`] plus bounded-wait acquisition.
///
/// The timed paths accept a relative [`Duration`] or anything convertible
/// into a [`Deadline`]: a monotonic [`std::time::Instant`] or a realtime
/// [`std::time::SystemTime`]. A relative budget is anchored to the monotonic
/// clock once, at entry; it is not restarted across internal retries. A
/// deadline already in the past yields a single non-blocking attempt.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use futexsync::SharedTimedMutex;
///
/// let mutex = SharedTimedMutex::new();
/// mutex.lock();
/// // Held exclusively: the timed attempt expires.
/// assert!(!mutex.try_lock_shared_for(Duration::from_millis(1)));
/// mutex.unlock();
/// assert!(mutex.try_lock_for(Duration::from_millis(1)));
/// mutex.unlock();
/// ```
#[derive(Debug)]
pub struct SharedTimedMutex {
    core: LockCore,
}

impl Default for SharedTimedMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedTimedMutex {
    /// Creates an unlocked mutex.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            core: LockCore::new(),
        }
    }

    /// Acquires exclusive ownership, parking until granted.
    pub fn lock(&self) {
        self.core.acquire_exclusive();
    }

    /// Attempts exclusive ownership without parking.
    #[must_use]
    pub fn try_lock(&self) -> bool {
        self.core.try_acquire_exclusive()
    }

    /// Attempts exclusive ownership, giving up after `timeout`.
    ///
    /// Returns `false` no earlier than `timeout` from now when the lock
    /// stays contended.
    #[must_use]
    pub fn try_lock_for(&self, timeout: Duration) -> bool {
        self.core.acquire_exclusive_deadline(Deadline::after(timeout))
    }

    /// Attempts exclusive ownership, giving up at `deadline`.
    #[must_use]
    pub fn try_lock_until(&self, deadline: impl Into<Deadline>) -> bool {
        self.core.acquire_exclusive_deadline(deadline.into())
    }

    /// Releases exclusive ownership.
    ///
    /// Calling this without holding the lock exclusively corrupts the lock
    /// state.
    pub fn unlock(&self) {
        self.core.release_exclusive();
    }

    /// Acquires shared ownership, parking while any writer demands the lock.
    pub fn lock_shared(&self) {
        self.core.acquire_shared();
    }

    /// Attempts shared ownership without parking.
    #[must_use]
    pub fn try_lock_shared(&self) -> bool {
        self.core.try_acquire_shared()
    }

    /// Attempts shared ownership, giving up after `timeout`.
    #[must_use]
    pub fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        self.core.acquire_shared_deadline(Deadline::after(timeout))
    }

    /// Attempts shared ownership, giving up at `deadline`.
    #[must_use]
    pub fn try_lock_shared_until(&self, deadline: impl Into<Deadline>) -> bool {
        self.core.acquire_shared_deadline(deadline.into())
    }

    /// Releases one shared hold.
    ///
    /// Calling this without holding the lock in shared mode corrupts the
    /// lock state.
    pub fn unlock_shared(&self) {
        self.core.release_shared();
    }
}

unsafe impl RawSharedLock for SharedTimedMutex {
    fn lock(&self) {
        Self::lock(self);
    }
    fn try_lock(&self) -> bool {
        Self::try_lock(self)
    }
    fn unlock(&self) {
        Self::unlock(self);
    }
    fn lock_shared(&self) {
        Self::lock_shared(self);
    }
    fn try_lock_shared(&self) -> bool {
        Self::try_lock_shared(self)
    }
    fn unlock_shared(&self) {
        Self::unlock_shared(self);
    }
}

unsafe impl RawSharedTimedLock for SharedTimedMutex {
    fn try_lock_for(&self, timeout: Duration) -> bool {
        Self::try_lock_for(self, timeout)
    }
    fn try_lock_until(&self, deadline: Deadline) -> bool {
        Self::try_lock_until(self, deadline)
    }
    fn try_lock_shared_for(&self, timeout: Duration) -> bool {
        Self::try_lock_shared_for(self, timeout)
    }
    fn try_lock_shared_until(&self, deadline: Deadline) -> bool {
        Self::try_lock_shared_until(self, deadline)
    }
}
