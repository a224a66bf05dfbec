//! Feature-gated contention-instrumented guarded value.
//!
//! When the `lock-metrics` feature is enabled, `Contended<T>` wraps
//! [`Guarded`](super::Guarded) and tracks wait time, hold time, contention
//! count, and acquisition counts split by mode. When disabled, it's a
//! zero-cost wrapper.
//!
//! # Usage
//!
//! ```ignore
//! use futexsync::Contended;
//!
//! let state = Contended::new("routing-table", 42);
//! {
//!     let guard = state.lock_shared();
//!     // use *guard
//! }
//!
//! #[cfg(feature = "lock-metrics")]
//! {
//!     let snap = state.snapshot();
//!     tracing::info!(
//!         exclusive = snap.exclusive_acquisitions,
//!         shared = snap.shared_acquisitions,
//!         "lock traffic"
//!     );
//! }
//! ```

/// Snapshot of lock contention metrics.
#[derive(Debug, Clone, Default)]
pub struct LockMetricsSnapshot {
    /// Human-readable name for this lock (e.g., "routing-table").
    pub name: &'static str,
    /// Successful exclusive acquisitions.
    pub exclusive_acquisitions: u64,
    /// Successful shared acquisitions.
    pub shared_acquisitions: u64,
    /// Acquisitions that found the lock already held (contended).
    pub contentions: u64,
    /// Cumulative nanoseconds spent waiting to acquire.
    pub wait_ns: u64,
    /// Cumulative nanoseconds the lock was held.
    pub hold_ns: u64,
    /// Maximum single wait duration in nanoseconds.
    pub max_wait_ns: u64,
    /// Maximum single hold duration in nanoseconds.
    pub max_hold_ns: u64,
}

// ── Feature-gated implementation ──────────────────────────────────────────

#[cfg(feature = "lock-metrics")]
mod inner {
    use super::LockMetricsSnapshot;
    use std::ops::{Deref, DerefMut};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Instant;

    use crate::sync::guarded::{ExclusiveGuard, Guarded, SharedReadGuard};
    use crate::sync::shared_mutex::SharedTimedMutex;

    /// Metrics counters split into two cache lines to avoid false sharing.
    /// Acquire-path counters are updated while taking the lock; release-path
    /// counters are updated from guard drops. Separating them prevents
    /// cross-invalidation between concurrent acquirers and releasers.
    #[derive(Debug)]
    #[repr(C)]
    struct Metrics {
        // ── Cache line 1: updated on acquisition ──
        exclusive_acquisitions: AtomicU64,
        shared_acquisitions: AtomicU64,
        contentions: AtomicU64,
        wait_ns: AtomicU64,
        max_wait_ns: AtomicU64,
        // Pad to 64 bytes (5 × 8 = 40 bytes of data, 24 bytes padding)
        _pad: [u8; 24],
        // ── Cache line 2: updated on guard drop ──
        hold_ns: AtomicU64,
        max_hold_ns: AtomicU64,
    }

    impl Default for Metrics {
        fn default() -> Self {
            Self {
                exclusive_acquisitions: AtomicU64::new(0),
                shared_acquisitions: AtomicU64::new(0),
                contentions: AtomicU64::new(0),
                wait_ns: AtomicU64::new(0),
                max_wait_ns: AtomicU64::new(0),
                _pad: [0; 24],
                hold_ns: AtomicU64::new(0),
                max_hold_ns: AtomicU64::new(0),
            }
        }
    }

    impl Metrics {
        fn update_max(current: &AtomicU64, value: u64) {
            let mut old = current.load(Ordering::Relaxed);
            while value > old {
                match current.compare_exchange_weak(
                    old,
                    value,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(actual) => old = actual,
                }
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        fn record_wait(&self, mode_counter: &AtomicU64, start: Instant, contended: bool) {
            let wait_ns = start.elapsed().as_nanos() as u64;
            mode_counter.fetch_add(1, Ordering::Relaxed);
            self.wait_ns.fetch_add(wait_ns, Ordering::Relaxed);
            Self::update_max(&self.max_wait_ns, wait_ns);
            if contended {
                self.contentions.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(wait_ns, "contended lock acquisition");
            }
        }
    }

    /// Contention-instrumented guarded value. Tracks wait/hold time and
    /// contention per mode.
    #[derive(Debug)]
    pub struct Contended<T> {
        inner: Guarded<T, SharedTimedMutex>,
        metrics: Metrics,
        name: &'static str,
    }

    impl<T> Contended<T> {
        /// Creates an instrumented wrapper with the given name and value.
        pub fn new(name: &'static str, value: T) -> Self {
            Self {
                inner: Guarded::new(value),
                metrics: Metrics::default(),
                name,
            }
        }

        /// Locks in exclusive mode, tracking contention metrics.
        pub fn lock(&self) -> ContendedWriteGuard<'_, T> {
            let start = Instant::now();
            let (guard, contended) = match self.inner.try_lock() {
                Some(guard) => (guard, false),
                None => (self.inner.lock(), true),
            };
            self.metrics
                .record_wait(&self.metrics.exclusive_acquisitions, start, contended);
            ContendedWriteGuard {
                guard: Some(guard),
                acquired_at: Instant::now(),
                metrics: &self.metrics,
            }
        }

        /// Attempts the exclusive lock without blocking.
        pub fn try_lock(&self) -> Option<ContendedWriteGuard<'_, T>> {
            let guard = self.inner.try_lock()?;
            self.metrics
                .exclusive_acquisitions
                .fetch_add(1, Ordering::Relaxed);
            Some(ContendedWriteGuard {
                guard: Some(guard),
                acquired_at: Instant::now(),
                metrics: &self.metrics,
            })
        }

        /// Locks in shared mode, tracking contention metrics.
        pub fn lock_shared(&self) -> ContendedReadGuard<'_, T> {
            let start = Instant::now();
            let (guard, contended) = match self.inner.try_lock_shared() {
                Some(guard) => (guard, false),
                None => (self.inner.lock_shared(), true),
            };
            self.metrics
                .record_wait(&self.metrics.shared_acquisitions, start, contended);
            ContendedReadGuard {
                guard: Some(guard),
                acquired_at: Instant::now(),
                metrics: &self.metrics,
            }
        }

        /// Attempts the shared lock without blocking.
        pub fn try_lock_shared(&self) -> Option<ContendedReadGuard<'_, T>> {
            let guard = self.inner.try_lock_shared()?;
            self.metrics
                .shared_acquisitions
                .fetch_add(1, Ordering::Relaxed);
            Some(ContendedReadGuard {
                guard: Some(guard),
                acquired_at: Instant::now(),
                metrics: &self.metrics,
            })
        }

        /// Returns a snapshot of the current metrics.
        pub fn snapshot(&self) -> LockMetricsSnapshot {
            LockMetricsSnapshot {
                name: self.name,
                exclusive_acquisitions: self.metrics.exclusive_acquisitions.load(Ordering::Relaxed),
                shared_acquisitions: self.metrics.shared_acquisitions.load(Ordering::Relaxed),
                contentions: self.metrics.contentions.load(Ordering::Relaxed),
                wait_ns: self.metrics.wait_ns.load(Ordering::Relaxed),
                hold_ns: self.metrics.hold_ns.load(Ordering::Relaxed),
                max_wait_ns: self.metrics.max_wait_ns.load(Ordering::Relaxed),
                max_hold_ns: self.metrics.max_hold_ns.load(Ordering::Relaxed),
            }
        }

        /// Resets all metrics to zero.
        pub fn reset_metrics(&self) {
            self.metrics.exclusive_acquisitions.store(0, Ordering::Relaxed);
            self.metrics.shared_acquisitions.store(0, Ordering::Relaxed);
            self.metrics.contentions.store(0, Ordering::Relaxed);
            self.metrics.wait_ns.store(0, Ordering::Relaxed);
            self.metrics.max_wait_ns.store(0, Ordering::Relaxed);
            self.metrics.hold_ns.store(0, Ordering::Relaxed);
            self.metrics.max_hold_ns.store(0, Ordering::Relaxed);
        }

        /// Returns the lock name.
        pub fn name(&self) -> &'static str {
            self.name
        }
    }

    /// Exclusive guard that records hold time on drop.
    pub struct ContendedWriteGuard<'a, T> {
        guard: Option<ExclusiveGuard<'a, T, SharedTimedMutex>>,
        acquired_at: Instant,
        metrics: &'a Metrics,
    }

    impl<T> Deref for ContendedWriteGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            self.guard.as_ref().expect("guard used after drop")
        }
    }

    impl<T> DerefMut for ContendedWriteGuard<'_, T> {
        fn deref_mut(&mut self) -> &mut T {
            self.guard.as_mut().expect("guard used after drop")
        }
    }

    impl<T> Drop for ContendedWriteGuard<'_, T> {
        #[allow(clippy::cast_possible_truncation)]
        fn drop(&mut self) {
            let hold_ns = self.acquired_at.elapsed().as_nanos() as u64;
            // Drop the inner guard (releases the lock) BEFORE updating
            // metrics to keep the critical section short.
            drop(self.guard.take());

            self.metrics.hold_ns.fetch_add(hold_ns, Ordering::Relaxed);
            Metrics::update_max(&self.metrics.max_hold_ns, hold_ns);
        }
    }

    impl<T: std::fmt::Debug> std::fmt::Debug for ContendedWriteGuard<'_, T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ContendedWriteGuard")
                .field("value", &self.guard)
                .finish()
        }
    }

    /// Shared guard that records hold time on drop.
    pub struct ContendedReadGuard<'a, T> {
        guard: Option<SharedReadGuard<'a, T, SharedTimedMutex>>,
        acquired_at: Instant,
        metrics: &'a Metrics,
    }

    impl<T> Deref for ContendedReadGuard<'_, T> {
        type Target = T;
        fn deref(&self) -> &T {
            self.guard.as_ref().expect("guard used after drop")
        }
    }

    impl<T> Drop for ContendedReadGuard<'_, T> {
        #[allow(clippy::cast_possible_truncation)]
        fn drop(&mut self) {
            let hold_ns = self.acquired_at.elapsed().as_nanos() as u64;
            drop(self.guard.take());

            self.metrics.hold_ns.fetch_add(hold_ns, Ordering::Relaxed);
            Metrics::update_max(&self.metrics.max_hold_ns, hold_ns);
        }
    }

    impl<T: std::fmt::Debug> std::fmt::Debug for ContendedReadGuard<'_, T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ContendedReadGuard")
                .field("value", &self.guard)
                .finish()
        }
    }
}

// ── No-op implementation (feature disabled) ───────────────────────────────

#[cfg(not(feature = "lock-metrics"))]
mod inner {
    use super::LockMetricsSnapshot;
    use std::ops::{Deref, DerefMut};

    use crate::sync::guarded::{ExclusiveGuard, Guarded, SharedReadGuard};
    use crate::sync::shared_mutex::SharedTimedMutex;

    /// Zero-cost guarded wrapper (metrics disabled).
    #[derive(Debug)]
    pub struct Contended<T> {
        inner: Guarded<T, SharedTimedMutex>,
        name: &'static str,
    }

    impl<T> Contended<T> {
        /// Creates a wrapper with the given name and value.
        #[inline]
        pub fn new(name: &'static str, value: T) -> Self {
            Self {
                inner: Guarded::new(value),
                name,
            }
        }

        /// Locks in exclusive mode (no instrumentation).
        #[inline]
        pub fn lock(&self) -> ContendedWriteGuard<'_, T> {
            ContendedWriteGuard {
                guard: self.inner.lock(),
            }
        }

        /// Attempts the exclusive lock without blocking.
        #[inline]
        pub fn try_lock(&self) -> Option<ContendedWriteGuard<'_, T>> {
            self.inner
                .try_lock()
                .map(|guard| ContendedWriteGuard { guard })
        }

        /// Locks in shared mode (no instrumentation).
        #[inline]
        pub fn lock_shared(&self) -> ContendedReadGuard<'_, T> {
            ContendedReadGuard {
                guard: self.inner.lock_shared(),
            }
        }

        /// Attempts the shared lock without blocking.
        #[inline]
        pub fn try_lock_shared(&self) -> Option<ContendedReadGuard<'_, T>> {
            self.inner
                .try_lock_shared()
                .map(|guard| ContendedReadGuard { guard })
        }

        /// Returns an empty snapshot (metrics disabled).
        pub fn snapshot(&self) -> LockMetricsSnapshot {
            LockMetricsSnapshot {
                name: self.name,
                ..Default::default()
            }
        }

        /// No-op (metrics disabled).
        pub fn reset_metrics(&self) {}

        /// Returns the lock name.
        pub fn name(&self) -> &'static str {
            self.name
        }
    }

    /// Zero-cost exclusive guard wrapper (metrics disabled).
    pub struct ContendedWriteGuard<'a, T> {
        guard: ExclusiveGuard<'a, T, SharedTimedMutex>,
    }

    impl<T> Deref for ContendedWriteGuard<'_, T> {
        type Target = T;
        #[inline]
        fn deref(&self) -> &T {
            &self.guard
        }
    }

    impl<T> DerefMut for ContendedWriteGuard<'_, T> {
        #[inline]
        fn deref_mut(&mut self) -> &mut T {
            &mut self.guard
        }
    }

    impl<T: std::fmt::Debug> std::fmt::Debug for ContendedWriteGuard<'_, T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ContendedWriteGuard")
                .field("value", &*self.guard)
                .finish()
        }
    }

    /// Zero-cost shared guard wrapper (metrics disabled).
    pub struct ContendedReadGuard<'a, T> {
        guard: SharedReadGuard<'a, T, SharedTimedMutex>,
    }

    impl<T> Deref for ContendedReadGuard<'_, T> {
        type Target = T;
        #[inline]
        fn deref(&self) -> &T {
            &self.guard
        }
    }

    impl<T: std::fmt::Debug> std::fmt::Debug for ContendedReadGuard<'_, T> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ContendedReadGuard")
                .field("value", &*self.guard)
                .finish()
        }
    }
}

pub use inner::{Contended, ContendedReadGuard, ContendedWriteGuard};
