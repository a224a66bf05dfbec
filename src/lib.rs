//! Writer-preferring shared mutex built directly on the OS parking primitive.
//!
//! This crate provides a reader-writer lock that parks contended threads in
//! the kernel (futex on Linux, `WaitOnAddress` on Windows) instead of layering
//! on top of another userspace lock. Three layers, leaves first:
//!
//! - [`park::ParkCell`]: a 32-bit atomic cell with wait / timed-wait / notify
//!   operations, abstracting the platform parking syscalls.
//! - [`SharedMutex`] / [`SharedTimedMutex`]: the reader-writer lock algorithm
//!   over two such cells, the timed variant adding bounded-wait acquisition.
//! - [`Guarded`]: an object-and-lock pairing whose scoped handles tie the
//!   lifetime of a lock mode to a value on the stack.
//!
//! # Writer preference
//!
//! Once any writer demands exclusive ownership, no further shared
//! acquisitions succeed until that writer has held and released the lock.
//! Writers block new readers while waiting, which prevents writer starvation
//! under heavy read load but can starve readers under a sustained stream of
//! writers. There is no FIFO ordering between writers.
//!
//! # Example
//!
//! ```
//! use futexsync::Guarded;
//!
//! let config: Guarded<_> = Guarded::new(vec![1, 2, 3]);
//!
//! // Any number of shared holders may read concurrently.
//! let a = config.lock_shared();
//! let b = a.clone();
//! assert_eq!(*a, *b);
//! drop((a, b));
//!
//! // An exclusive holder gets mutable access.
//! config.lock().push(4);
//! assert_eq!(config.lock_shared().len(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod park;
pub mod sync;
pub mod time;

#[cfg(test)]
pub(crate) mod test_utils;

pub use sync::{
    ExclusiveGuard, ExclusiveReadGuard, Guarded, RawSharedLock, RawSharedTimedLock,
    SharedMutex, SharedReadGuard, SharedTimedMutex,
};
pub use sync::{Contended, ContendedReadGuard, ContendedWriteGuard, LockMetricsSnapshot};
pub use time::Deadline;
