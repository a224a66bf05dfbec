//! WaitOnAddress backend.
//!
//! Both deadline clocks translate to a millisecond duration at call time;
//! sub-millisecond remainders round up, so a timeout is never reported
//! earlier than the requested instant.

use std::ffi::c_void;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

use winapi::shared::winerror::ERROR_TIMEOUT;
use winapi::um::errhandlingapi::GetLastError;
use winapi::um::synchapi::{WaitOnAddress, WakeByAddressAll, WakeByAddressSingle};
use winapi::um::winbase::INFINITE;

use crate::time::Deadline;

pub(super) fn wait(cell: &AtomicU32, expected: u32) {
    wait_millis(cell, expected, INFINITE);
}

/// Returns `false` only on `ERROR_TIMEOUT`; spurious wakeups and value
/// mismatches report `true` and are absorbed by the caller's retry loop.
pub(super) fn wait_deadline(cell: &AtomicU32, expected: u32, deadline: Deadline) -> bool {
    let Some(remaining) = deadline.remaining() else {
        return false;
    };
    wait_millis(cell, expected, millis_round_up(remaining))
}

fn wait_millis(cell: &AtomicU32, expected: u32, millis: u32) -> bool {
    let mut compare = expected;
    let ok = unsafe {
        WaitOnAddress(
            (cell as *const AtomicU32).cast::<c_void>().cast_mut(),
            (&mut compare as *mut u32).cast::<c_void>(),
            std::mem::size_of::<u32>(),
            millis,
        )
    };
    if ok != 0 {
        return true;
    }
    unsafe { GetLastError() != ERROR_TIMEOUT }
}

pub(super) fn wake_one(cell: &AtomicU32) {
    unsafe {
        WakeByAddressSingle((cell as *const AtomicU32).cast::<c_void>().cast_mut());
    }
}

pub(super) fn wake_all(cell: &AtomicU32) {
    unsafe {
        WakeByAddressAll((cell as *const AtomicU32).cast::<c_void>().cast_mut());
    }
}

#[allow(clippy::cast_possible_truncation)]
fn millis_round_up(remaining: Duration) -> u32 {
    let millis = remaining.as_nanos().div_ceil(1_000_000);
    millis.min(u128::from(INFINITE - 1)) as u32
}
