/*!
 * Monotonic Timestamps
 *
 * Strictly increasing 64-bit values, process-wide.
 *
 * Each call computes `max(clock reading, last returned + 1)` while holding
 * the generator's critical section, so values stay unique and increasing
 * even when the clock stalls or steps backwards.
 */

use super::concurrent::Concurrent;
use super::critical_section::CriticalSection;
use super::lazy::LazyFactory;
use crate::core::errors::{SyncError, SyncResult};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::trace;

static STATIC_LAZY: LazyLock<LazyFactory> = LazyLock::new(LazyFactory::new);

/// High-resolution tick source
pub trait ClockSource: Send + Sync {
    fn now(&self) -> i64;
}

/// Nanoseconds elapsed since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    anchor: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    #[inline]
    fn now(&self) -> i64 {
        i64::try_from(self.anchor.elapsed().as_nanos()).unwrap_or(i64::MAX)
    }
}

impl<F> ClockSource for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn now(&self) -> i64 {
        self()
    }
}

/// Timestamp generator
pub struct Timestamp {
    section: CriticalSection,
    clock: Box<dyn ClockSource>,
    // only written while `section` is held
    last: AtomicI64,
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::new()
    }
}

impl Timestamp {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }

    pub fn with_clock(clock: impl ClockSource + 'static) -> Self {
        Self {
            section: CriticalSection::new(),
            clock: Box::new(clock),
            last: AtomicI64::new(i64::MIN),
        }
    }

    /// Process-wide generator
    pub fn global() -> Arc<Timestamp> {
        STATIC_LAZY.get("Timestamp::global", Timestamp::new)
    }

    /// Next value of the process-wide generator
    pub fn next() -> i64 {
        Self::global().next_value()
    }

    /// Next value of this generator
    ///
    /// # Panics
    ///
    /// Panics once the generator is exhausted (a value of `i64::MAX` was
    /// already issued), like integer overflow in std. Use
    /// [`try_next_value`](Self::try_next_value) where the clock source is
    /// not trusted.
    pub fn next_value(&self) -> i64 {
        match self.try_next_value() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Next value, or `TimestampExhausted` instead of a duplicate
    pub fn try_next_value(&self) -> SyncResult<i64> {
        self.thread_safe(|| {
            let last = self.last.load(Ordering::Relaxed);
            // i64::MIN marks "nothing issued" and is itself never issued
            let floor = last.checked_add(1).ok_or(SyncError::TimestampExhausted)?;
            let reading = self.clock.now();
            if reading < floor {
                trace!(reading, last, "Clock stalled; advancing past last timestamp");
            }
            let value = reading.max(floor);
            self.last.store(value, Ordering::Relaxed);
            Ok(value)
        })
    }

    /// Most recently returned value, if any
    pub fn last(&self) -> Option<i64> {
        let last = self.thread_safe(|| self.last.load(Ordering::Relaxed));
        (last != i64::MIN).then_some(last)
    }
}

impl Concurrent for Timestamp {
    type Family = Timestamp;

    fn critical_section(&self) -> &CriticalSection {
        &self.section
    }
}
