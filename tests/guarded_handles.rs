//! Guarded handle behavior suite.
//!
//! Exercises the ownership contract of the three handle kinds: move,
//! widening, shared copy, reset-by-drop, timed acquisition through the
//! wrapper, and cross-thread hand-off.
//!
//! Run with: `cargo test --test guarded_handles`

mod common {
    pub fn init_test_logging() {
        // Initialize tracing for tests if not already done
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init();
    }
}

/// Phase tracking macro for structured test logging.
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Assertion with logging for better test output.
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            tracing::error!(
                message = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use futexsync::{ExclusiveReadGuard, Guarded, SharedMutex, SharedReadGuard, SharedTimedMutex};

fn init_test(name: &str) {
    common::init_test_logging();
    test_phase!(name);
}

#[test]
fn try_lock_succeeds_on_fresh_wrapper() {
    init_test("try_lock_succeeds_on_fresh_wrapper");
    let obj = Guarded::<_, SharedTimedMutex>::new(0_i32);
    let acquired = obj.try_lock().is_some();
    assert_with_log!(acquired, "fresh try_lock", true, acquired);
}

#[test]
fn try_lock_fails_while_guard_lives() {
    init_test("try_lock_fails_while_guard_lives");
    let obj = Guarded::<_, SharedTimedMutex>::new(0_i32);
    let guard = obj.lock();
    let refused = obj.try_lock().is_none();
    assert_with_log!(refused, "try_lock under guard", true, refused);
    drop(guard);
}

#[test]
fn shared_handles_stack() {
    init_test("shared_handles_stack");
    let obj = Guarded::<_, SharedTimedMutex>::new(0_i32);
    let first = obj.lock_shared();
    let second = obj.try_lock_shared();
    let stacked = second.is_some();
    assert_with_log!(stacked, "second shared handle", true, stacked);
    drop(first);
    drop(second);
}

#[test]
fn moved_handle_keeps_the_hold() {
    init_test("moved_handle_keeps_the_hold");
    let obj = Guarded::<_, SharedTimedMutex>::new(5_i32);
    let guard = obj.lock();
    let moved = guard;
    let refused = obj.try_lock().is_none();
    assert_with_log!(refused, "hold survives the move", true, refused);
    drop(moved);
    let admitted = obj.try_lock().is_some();
    assert_with_log!(admitted, "released after moved guard drops", true, admitted);
}

#[test]
fn widening_transfers_the_same_hold() {
    init_test("widening_transfers_the_same_hold");
    let obj = Guarded::<_, SharedTimedMutex>::new(String::from("payload"));

    let read: ExclusiveReadGuard<'_, _, _> = obj.lock().into();
    let len = read.len();
    assert_with_log!(len == 7, "read view of payload", 7usize, len);
    let refused = obj.try_lock().is_none();
    assert_with_log!(refused, "widened guard still excludes", true, refused);
    drop(read);

    let admitted = obj.try_lock().is_some();
    assert_with_log!(admitted, "released after widened drop", true, admitted);
}

#[test]
fn shared_copy_blocks_writers_until_last_drop() {
    init_test("shared_copy_blocks_writers_until_last_drop");
    let obj = Guarded::<_, SharedTimedMutex>::new(3_u64);

    let original = obj.lock_shared();
    let copy: SharedReadGuard<'_, _, _> = original.clone();
    drop(original);

    let refused = obj.try_lock().is_none();
    assert_with_log!(refused, "copy holds after original drops", true, refused);
    assert_with_log!(*copy == 3, "copy reads", 3u64, *copy);
    drop(copy);

    let admitted = obj.try_lock().is_some();
    assert_with_log!(admitted, "free after last copy", true, admitted);
}

#[test]
fn handle_moves_between_threads() {
    init_test("handle_moves_between_threads");
    let obj = Arc::new(Guarded::<u64>::new(1));
    let mut guard = obj.lock();
    *guard = 2;

    let worker_obj = Arc::clone(&obj);
    let observed = thread::scope(|scope| {
        let handle = scope.spawn(move || {
            // The exclusive hold travelled with the guard; release it here.
            drop(guard);
            *worker_obj.lock_shared()
        });
        handle.join().expect("worker should complete")
    });
    assert_with_log!(observed == 2, "worker read after release", 2u64, observed);

    let value = *obj.lock_shared();
    assert_with_log!(value == 2, "value written before hand-off", 2u64, value);
}

#[test]
fn exclusive_read_guard_from_lock_read() {
    init_test("exclusive_read_guard_from_lock_read");
    let obj = Guarded::<_, SharedTimedMutex>::new(vec![1_u8, 2]);
    let read = obj.lock_read();
    let refused = obj.try_lock_shared().is_none();
    assert_with_log!(refused, "lock_read is exclusive", true, refused);
    assert_with_log!(read.len() == 2, "read access", 2usize, read.len());
    drop(read);
}

#[test]
fn timed_paths_mirror_untimed_modes() {
    init_test("timed_paths_mirror_untimed_modes");
    let obj = Guarded::<_, SharedTimedMutex>::new(0_u32);
    let guard = obj.lock();

    let timeout = Duration::from_millis(1);
    let exclusive = obj.try_lock_for(timeout).is_none();
    assert_with_log!(exclusive, "timed exclusive refused", true, exclusive);
    let read = obj.try_lock_read_for(timeout).is_none();
    assert_with_log!(read, "timed exclusive-read refused", true, read);
    let shared = obj
        .try_lock_shared_until(Instant::now() + timeout)
        .is_none();
    assert_with_log!(shared, "timed shared refused", true, shared);

    drop(guard);
    let admitted = obj.try_lock_until(Instant::now() + timeout).is_some();
    assert_with_log!(admitted, "timed exclusive admitted", true, admitted);
}

#[test]
fn wrapper_parameterized_by_untimed_lock() {
    init_test("wrapper_parameterized_by_untimed_lock");
    let obj: Guarded<u32, SharedMutex> = Guarded::new(8);
    {
        let mut guard = obj.lock();
        *guard *= 2;
    }
    let shared = obj.lock_shared();
    assert_with_log!(*shared == 16, "untimed parameter works", 16u32, *shared);
    drop(shared);
}

#[test]
fn guard_released_on_panic_unwind() {
    init_test("guard_released_on_panic_unwind");
    let obj = Arc::new(Guarded::<u32>::new(0));

    let panicking_obj = Arc::clone(&obj);
    let result = thread::spawn(move || {
        let _guard = panicking_obj.lock();
        panic!("poisoning is not a concept here; the hold must still release");
    })
    .join();
    assert_with_log!(result.is_err(), "worker panicked", true, result.is_err());

    // The unwind ran the guard's drop, so the lock is free again.
    let admitted = obj.try_lock().is_some();
    assert_with_log!(admitted, "released by unwind", true, admitted);
}
