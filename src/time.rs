//! Deadline vocabulary for timed lock acquisition.
//!
//! Timed waits accept either a monotonic-clock time point ([`Instant`]) or a
//! realtime-clock time point ([`SystemTime`]); [`Deadline`] unifies the two so
//! the parking backend can select the matching kernel wait operator.

use std::time::{Duration, Instant, SystemTime};

/// An absolute point in time at which a timed wait gives up.
///
/// A relative timeout is anchored to the monotonic clock once, at the start
/// of the operation, via [`Deadline::after`]; retries inside an acquisition
/// loop consume the remaining budget rather than restarting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deadline {
    /// A monotonic-clock deadline. Immune to wall-clock adjustments.
    Monotonic(Instant),
    /// A realtime-clock deadline. Honors wall-clock adjustments: setting the
    /// clock forward past the deadline expires the wait.
    Realtime(SystemTime),
}

impl Deadline {
    /// Returns the monotonic deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self::Monotonic(Instant::now() + timeout)
    }

    /// Returns true once the deadline is in the past.
    #[must_use]
    pub fn has_passed(&self) -> bool {
        self.remaining().is_none()
    }

    /// Time left until the deadline, or `None` once it has passed.
    ///
    /// For [`Deadline::Realtime`] this consults the wall clock, so the result
    /// can grow if the clock is set backwards.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Self::Monotonic(at) => at.checked_duration_since(Instant::now()),
            Self::Realtime(at) => at.duration_since(SystemTime::now()).ok(),
        }
        .filter(|left| !left.is_zero())
    }
}

impl From<Instant> for Deadline {
    fn from(at: Instant) -> Self {
        Self::Monotonic(at)
    }
}

impl From<SystemTime> for Deadline {
    fn from(at: SystemTime) -> Self {
        Self::Realtime(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn zero_timeout_has_passed() {
        init_test("zero_timeout_has_passed");
        let deadline = Deadline::after(Duration::ZERO);
        let passed = deadline.has_passed();
        crate::assert_with_log!(passed, "zero timeout passed", true, passed);
        crate::test_complete!("zero_timeout_has_passed");
    }

    #[test]
    fn future_deadline_reports_remaining() {
        init_test("future_deadline_reports_remaining");
        let deadline = Deadline::after(Duration::from_secs(60));
        let remaining = deadline.remaining().expect("deadline in the future");
        crate::assert_with_log!(
            remaining > Duration::from_secs(59),
            "remaining near full budget",
            true,
            remaining > Duration::from_secs(59)
        );
        crate::test_complete!("future_deadline_reports_remaining");
    }

    #[test]
    fn past_instant_has_passed() {
        init_test("past_instant_has_passed");
        let deadline = Deadline::from(Instant::now());
        // `Instant::now()` is already in the past by the time we check.
        let passed = deadline.has_passed();
        crate::assert_with_log!(passed, "past instant", true, passed);
        crate::test_complete!("past_instant_has_passed");
    }

    #[test]
    fn realtime_conversions() {
        init_test("realtime_conversions");
        let future = SystemTime::now() + Duration::from_secs(60);
        let deadline = Deadline::from(future);
        let is_realtime = matches!(deadline, Deadline::Realtime(_));
        crate::assert_with_log!(is_realtime, "realtime variant", true, is_realtime);
        crate::assert_with_log!(!deadline.has_passed(), "not passed", false, deadline.has_passed());

        let past = SystemTime::now() - Duration::from_secs(60);
        let passed = Deadline::from(past).has_passed();
        crate::assert_with_log!(passed, "past realtime", true, passed);
        crate::test_complete!("realtime_conversions");
    }
}
