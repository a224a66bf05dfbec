//! Futex backend.
//!
//! Untimed waits and monotonic deadlines use `FUTEX_WAIT` with a relative
//! timeout (the remaining budget is recomputed from the deadline on every
//! call, so retry loops consume one budget). Realtime deadlines use
//! `FUTEX_WAIT_BITSET | FUTEX_CLOCK_REALTIME` with an absolute timespec, so
//! wall-clock adjustments are honored by the kernel rather than approximated
//! at call time.

use std::ptr;
use std::sync::atomic::AtomicU32;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::time::Deadline;

// Wait regardless of which bits are set in the wake mask.
const FUTEX_BITSET_MATCH_ANY: u32 = 0xffff_ffff;

pub(super) fn wait(cell: &AtomicU32, expected: u32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            cell as *const AtomicU32,
            libc::FUTEX_WAIT,
            expected,
            ptr::null::<libc::timespec>(),
        );
    }
}

/// Returns `false` only on `ETIMEDOUT`. `EAGAIN` (value mismatch) and
/// `EINTR` report `true`; the caller's retry loop absorbs them.
pub(super) fn wait_deadline(cell: &AtomicU32, expected: u32, deadline: Deadline) -> bool {
    let rc = match deadline {
        Deadline::Monotonic(_) => {
            let Some(remaining) = deadline.remaining() else {
                return false;
            };
            let timeout = relative_timespec(remaining);
            unsafe {
                libc::syscall(
                    libc::SYS_futex,
                    cell as *const AtomicU32,
                    libc::FUTEX_WAIT,
                    expected,
                    ptr::addr_of!(timeout),
                )
            }
        }
        Deadline::Realtime(at) => {
            let Some(timeout) = absolute_timespec(at) else {
                // Pre-epoch deadline: expired long ago.
                return false;
            };
            unsafe {
                libc::syscall(
                    libc::SYS_futex,
                    cell as *const AtomicU32,
                    libc::FUTEX_WAIT_BITSET | libc::FUTEX_CLOCK_REALTIME,
                    expected,
                    ptr::addr_of!(timeout),
                    ptr::null::<u32>(),
                    FUTEX_BITSET_MATCH_ANY,
                )
            }
        }
    };

    if rc == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() != Some(libc::ETIMEDOUT)
}

pub(super) fn wake_one(cell: &AtomicU32) {
    unsafe {
        libc::syscall(libc::SYS_futex, cell as *const AtomicU32, libc::FUTEX_WAKE, 1);
    }
}

pub(super) fn wake_all(cell: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            cell as *const AtomicU32,
            libc::FUTEX_WAKE,
            i32::MAX,
        );
    }
}

#[allow(clippy::cast_possible_wrap)]
fn relative_timespec(remaining: Duration) -> libc::timespec {
    libc::timespec {
        tv_sec: libc::time_t::try_from(remaining.as_secs()).unwrap_or(libc::time_t::MAX),
        tv_nsec: remaining.subsec_nanos() as libc::c_long,
    }
}

#[allow(clippy::cast_possible_wrap)]
fn absolute_timespec(at: SystemTime) -> Option<libc::timespec> {
    let since_epoch = at.duration_since(UNIX_EPOCH).ok()?;
    Some(libc::timespec {
        tv_sec: libc::time_t::try_from(since_epoch.as_secs()).unwrap_or(libc::time_t::MAX),
        tv_nsec: since_epoch.subsec_nanos() as libc::c_long,
    })
}
