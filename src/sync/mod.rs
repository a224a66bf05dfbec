//! Synchronization primitives: the shared mutex, its timed variant, and the
//! guarded-value wrapper.
//!
//! # Primitives
//!
//! - [`SharedMutex`]: writer-preferring reader-writer lock over two parking
//!   cells.
//! - [`SharedTimedMutex`]: the same lock with bounded-wait acquisition.
//! - [`Guarded`]: a value-and-lock pairing whose handles tie lock ownership
//!   to a scope.
//! - [`Contended`]: contention-instrumented `Guarded` (feature
//!   `lock-metrics`; zero-cost wrapper when disabled).
//!
//! # Writer preference
//!
//! Readers refuse to enter whenever any writer demands the lock, so a single
//! writer gets through a storm of readers in bounded time. The flip side is
//! intentional: an unending stream of writers starves readers indefinitely.

mod contended;
mod guarded;
mod raw;
mod shared_mutex;

pub use contended::{Contended, ContendedReadGuard, ContendedWriteGuard, LockMetricsSnapshot};
pub use guarded::{ExclusiveGuard, ExclusiveReadGuard, Guarded, SharedReadGuard};
pub use raw::{RawSharedLock, RawSharedTimedLock};
pub use shared_mutex::{SharedMutex, SharedTimedMutex};
