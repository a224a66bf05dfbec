//! The parking primitive: a 32-bit atomic cell threads can block on.
//!
//! [`ParkCell`] pairs an [`AtomicU32`] with the OS wait queue keyed on its
//! address (futex on Linux, `WaitOnAddress` on Windows). The defining
//! guarantee is that the value check and the park happen atomically with
//! respect to notifies: a notify issued after a waiter observed the expected
//! value but before it parked cannot be lost, because the kernel re-checks
//! the cell under its own queue lock before blocking.
//!
//! Waits may return spuriously; callers are expected to re-check their
//! predicate in a loop.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

#[cfg(not(any(target_os = "linux", windows)))]
compile_error!("futexsync supports only Linux (futex) and Windows (WaitOnAddress)");

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::time::Deadline;

/// A 32-bit atomic cell with kernel-backed wait and notify.
///
/// All atomic operations take explicit orderings; the parking operations
/// themselves impose no ordering beyond the syscall boundary.
#[derive(Debug)]
#[repr(transparent)]
pub struct ParkCell {
    value: AtomicU32,
}

impl ParkCell {
    /// Creates a cell holding `value`.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self {
            value: AtomicU32::new(value),
        }
    }

    /// Loads the cell's value.
    #[inline]
    #[must_use]
    pub fn load(&self, order: Ordering) -> u32 {
        self.value.load(order)
    }

    /// Stores `value` into the cell.
    #[inline]
    pub fn store(&self, value: u32, order: Ordering) {
        self.value.store(value, order);
    }

    /// Adds `delta` to the cell, returning the previous value.
    #[inline]
    pub fn fetch_add(&self, delta: u32, order: Ordering) -> u32 {
        self.value.fetch_add(delta, order)
    }

    /// Subtracts `delta` from the cell, returning the previous value.
    #[inline]
    pub fn fetch_sub(&self, delta: u32, order: Ordering) -> u32 {
        self.value.fetch_sub(delta, order)
    }

    /// Stores `desired` if the cell holds `expected`.
    ///
    /// On failure returns the observed value. This is the strong variant:
    /// it does not fail spuriously.
    #[inline]
    pub fn compare_exchange(
        &self,
        expected: u32,
        desired: u32,
        success: Ordering,
        failure: Ordering,
    ) -> Result<u32, u32> {
        self.value
            .compare_exchange(expected, desired, success, failure)
    }

    /// Parks the calling thread while the cell holds `expected`.
    ///
    /// Returns immediately if the cell no longer holds `expected` at the
    /// kernel-side check. May return spuriously; a notify arriving between
    /// the check and the park is never lost.
    pub fn wait(&self, expected: u32) {
        sys::wait(&self.value, expected);
    }

    /// As [`wait`](Self::wait), giving up at `deadline`.
    ///
    /// Returns `false` on timeout and `true` otherwise (including value
    /// mismatch, notify, and spurious wakeups). A deadline already in the
    /// past never parks and reports whether the cell still holds `expected`.
    ///
    /// On Windows the remaining time is rounded up to whole milliseconds, so
    /// a timeout is never reported earlier than the requested instant.
    pub fn wait_until(&self, expected: u32, deadline: Deadline) -> bool {
        if deadline.has_passed() {
            return self.value.load(Ordering::Acquire) == expected;
        }
        sys::wait_deadline(&self.value, expected, deadline)
    }

    /// As [`wait_until`](Self::wait_until) with a deadline `timeout`
    /// from now on the monotonic clock.
    pub fn wait_for(&self, expected: u32, timeout: Duration) -> bool {
        self.wait_until(expected, Deadline::after(timeout))
    }

    /// Wakes one thread parked on this cell. Valid with zero waiters.
    pub fn notify_one(&self) {
        sys::wake_one(&self.value);
    }

    /// Wakes every thread parked on this cell. Valid with zero waiters.
    pub fn notify_all(&self) {
        sys::wake_all(&self.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn atomic_operations() {
        init_test("atomic_operations");
        let cell = ParkCell::new(5);
        crate::assert_with_log!(cell.load(Ordering::Relaxed) == 5, "initial", 5u32, cell.load(Ordering::Relaxed));

        let prev = cell.fetch_add(3, Ordering::AcqRel);
        crate::assert_with_log!(prev == 5, "fetch_add previous", 5u32, prev);
        let prev = cell.fetch_sub(1, Ordering::AcqRel);
        crate::assert_with_log!(prev == 8, "fetch_sub previous", 8u32, prev);

        let swapped = cell.compare_exchange(7, 42, Ordering::Acquire, Ordering::Acquire);
        crate::assert_with_log!(swapped == Ok(7), "cas success", Ok::<u32, u32>(7), swapped);
        let failed = cell.compare_exchange(7, 0, Ordering::Acquire, Ordering::Acquire);
        crate::assert_with_log!(failed == Err(42), "cas failure observes", Err::<u32, u32>(42), failed);

        cell.store(0, Ordering::Release);
        crate::assert_with_log!(cell.load(Ordering::Acquire) == 0, "store", 0u32, cell.load(Ordering::Acquire));
        crate::test_complete!("atomic_operations");
    }

    #[test]
    fn wait_returns_on_value_mismatch() {
        init_test("wait_returns_on_value_mismatch");
        let cell = ParkCell::new(1);
        // The kernel-side check sees 1 != 0 and refuses to park.
        cell.wait(0);
        crate::test_complete!("wait_returns_on_value_mismatch");
    }

    #[test]
    fn notify_without_waiters_is_valid() {
        init_test("notify_without_waiters_is_valid");
        let cell = ParkCell::new(0);
        cell.notify_one();
        cell.notify_all();
        crate::test_complete!("notify_without_waiters_is_valid");
    }

    #[test]
    fn expired_deadline_reports_value_check() {
        init_test("expired_deadline_reports_value_check");
        let cell = ParkCell::new(3);
        let expired = Deadline::after(Duration::ZERO);
        let matches = cell.wait_until(3, expired);
        crate::assert_with_log!(matches, "value still expected", true, matches);
        let differs = cell.wait_until(4, expired);
        crate::assert_with_log!(!differs, "value not expected", false, differs);
        crate::test_complete!("expired_deadline_reports_value_check");
    }

    #[test]
    fn wait_for_expires_while_value_unchanged() {
        init_test("wait_for_expires_while_value_unchanged");
        let cell = ParkCell::new(0);
        let woken = cell.wait_for(0, Duration::from_millis(10));
        crate::assert_with_log!(!woken, "timed out", false, woken);
        crate::test_complete!("wait_for_expires_while_value_unchanged");
    }

    #[test]
    fn notify_releases_parked_thread() {
        init_test("notify_releases_parked_thread");
        let cell = Arc::new(ParkCell::new(0));
        let waiter_cell = Arc::clone(&cell);

        let waiter = thread::spawn(move || {
            while waiter_cell.load(Ordering::Acquire) == 0 {
                waiter_cell.wait(0);
            }
            waiter_cell.load(Ordering::Acquire)
        });

        thread::sleep(Duration::from_millis(20));
        cell.store(7, Ordering::Release);
        cell.notify_one();

        let observed = waiter.join().expect("waiter thread panicked");
        crate::assert_with_log!(observed == 7, "woken with new value", 7u32, observed);
        crate::test_complete!("notify_releases_parked_thread");
    }

    #[test]
    fn realtime_deadline_times_out() {
        init_test("realtime_deadline_times_out");
        let cell = ParkCell::new(0);
        let deadline = Deadline::from(std::time::SystemTime::now() + Duration::from_millis(10));
        let woken = cell.wait_until(0, deadline);
        crate::assert_with_log!(!woken, "realtime timeout", false, woken);
        crate::test_complete!("realtime_deadline_times_out");
    }
}
