/*!
 * Concurrent Objects
 *
 * Thread-safety helpers for types that own a [`CriticalSection`].
 *
 * # Instance vs. Family Scope
 *
 * Instance helpers (`thread_safe`, `atomic`, ...) lock the object's own
 * critical section. The `static_*` helpers lock the section shared by every
 * implementor naming the same `Family`: types that set
 * `type Family = Synchronized` all serialize on the process-wide lock, a type
 * that sets `type Family = Self` gets a lock of its own. Families trade
 * throughput for simplicity; use instance scope where isolation matters.
 *
 * Semaphore helpers delegate to [`SemaphoreRegistry::global`], which never
 * touches any critical section.
 *
 * # Example
 *
 * ```
 * use vstools_sync::core::sync::{Concurrent, CriticalSection};
 * use std::sync::atomic::{AtomicU32, Ordering};
 *
 * struct Counter {
 *     section: CriticalSection,
 *     value: AtomicU32,
 * }
 *
 * impl Concurrent for Counter {
 *     type Family = Self;
 *
 *     fn critical_section(&self) -> &CriticalSection {
 *         &self.section
 *     }
 * }
 *
 * let counter = Counter { section: CriticalSection::new(), value: AtomicU32::new(0) };
 * let bumped = counter.atomic(
 *     || counter.value.load(Ordering::Relaxed) == 0,
 *     || counter.value.store(1, Ordering::Relaxed),
 * );
 * assert!(bumped);
 * ```
 */

use super::critical_section::CriticalSection;
use super::semaphore::{NamedSemaphore, SemaphoreRegistry};
use crate::core::errors::SyncResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub trait Concurrent {
    /// Marker selecting the family-wide lock used by the `static_*` helpers
    type Family: ?Sized + 'static;

    fn critical_section(&self) -> &CriticalSection;

    fn static_critical_section() -> &'static CriticalSection
    where
        Self: Sized,
    {
        CriticalSection::for_type::<Self::Family>()
    }

    // Instance scope

    fn enter_critical_section(&self) {
        self.critical_section().enter();
    }

    fn try_enter_critical_section(&self) -> bool {
        self.critical_section().try_enter()
    }

    fn leave_critical_section(&self) {
        self.critical_section().leave();
    }

    fn abort_critical_section(&self) {
        self.critical_section().abort();
    }

    fn thread_safe<R>(&self, f: impl FnOnce() -> R) -> R {
        self.critical_section().thread_safe(f)
    }

    fn atomic(&self, test: impl FnOnce() -> bool, action: impl FnOnce()) -> bool {
        self.critical_section().atomic(test, action)
    }

    fn atomic_else(
        &self,
        test: impl FnOnce() -> bool,
        action: impl FnOnce(),
        action_else: impl FnOnce(),
    ) -> bool {
        self.critical_section().atomic_else(test, action, action_else)
    }

    fn thread_safe_init<T>(&self, get: impl Fn() -> Option<T>, init: impl FnOnce()) -> Option<T> {
        self.critical_section().thread_safe_init(get, init)
    }

    // Family scope

    fn static_enter_critical_section()
    where
        Self: Sized,
    {
        Self::static_critical_section().enter();
    }

    fn static_try_enter_critical_section() -> bool
    where
        Self: Sized,
    {
        Self::static_critical_section().try_enter()
    }

    fn static_leave_critical_section()
    where
        Self: Sized,
    {
        Self::static_critical_section().leave();
    }

    fn static_abort_critical_section()
    where
        Self: Sized,
    {
        Self::static_critical_section().abort();
    }

    fn static_thread_safe<R>(f: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        Self::static_critical_section().thread_safe(f)
    }

    fn static_atomic(test: impl FnOnce() -> bool, action: impl FnOnce()) -> bool
    where
        Self: Sized,
    {
        Self::static_critical_section().atomic(test, action)
    }

    fn static_atomic_else(
        test: impl FnOnce() -> bool,
        action: impl FnOnce(),
        action_else: impl FnOnce(),
    ) -> bool
    where
        Self: Sized,
    {
        Self::static_critical_section().atomic_else(test, action, action_else)
    }

    fn static_thread_safe_init<T>(get: impl Fn() -> Option<T>, init: impl FnOnce()) -> Option<T>
    where
        Self: Sized,
    {
        Self::static_critical_section().thread_safe_init(get, init)
    }

    // Named semaphores

    fn alloc(name: &str, n: usize) -> SyncResult<Arc<NamedSemaphore>>
    where
        Self: Sized,
    {
        SemaphoreRegistry::global().alloc(name, n)
    }

    fn free(name: &str) -> bool
    where
        Self: Sized,
    {
        SemaphoreRegistry::global().free(name)
    }

    fn get(name: &str, timeout: Option<Duration>, n: usize) -> SyncResult<bool>
    where
        Self: Sized,
    {
        SemaphoreRegistry::global().get(name, timeout, n)
    }

    fn get_async<'a>(
        name: &'a str,
        timeout: Option<Duration>,
        n: usize,
    ) -> impl Future<Output = SyncResult<bool>> + Send + 'a
    where
        Self: Sized,
    {
        SemaphoreRegistry::global().get_async(name, timeout, n)
    }

    fn release(name: &str) -> SyncResult<()>
    where
        Self: Sized,
    {
        SemaphoreRegistry::global().release(name)
    }
}
