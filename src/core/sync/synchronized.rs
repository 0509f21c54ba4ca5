/*!
 * Synchronized Facade
 *
 * Process-wide lock and semaphore helpers for code outside any
 * [`Concurrent`](super::Concurrent) type. `Synchronized` is uninhabited: it
 * only names the global family, so implementors choosing
 * `type Family = Synchronized` share the very lock these helpers take.
 */

use super::critical_section::CriticalSection;
use super::semaphore::{NamedSemaphore, SemaphoreRegistry};
use crate::core::errors::SyncResult;
use std::sync::Arc;
use std::time::Duration;

pub enum Synchronized {}

impl Synchronized {
    pub fn critical_section() -> &'static CriticalSection {
        CriticalSection::for_type::<Synchronized>()
    }

    pub fn enter_critical_section() {
        Self::critical_section().enter();
    }

    pub fn try_enter_critical_section() -> bool {
        Self::critical_section().try_enter()
    }

    pub fn leave_critical_section() {
        Self::critical_section().leave();
    }

    pub fn abort_critical_section() {
        Self::critical_section().abort();
    }

    pub fn thread_safe<R>(f: impl FnOnce() -> R) -> R {
        Self::critical_section().thread_safe(f)
    }

    pub fn atomic(test: impl FnOnce() -> bool, action: impl FnOnce()) -> bool {
        Self::critical_section().atomic(test, action)
    }

    pub fn atomic_else(
        test: impl FnOnce() -> bool,
        action: impl FnOnce(),
        action_else: impl FnOnce(),
    ) -> bool {
        Self::critical_section().atomic_else(test, action, action_else)
    }

    pub fn thread_safe_init<T>(get: impl Fn() -> Option<T>, init: impl FnOnce()) -> Option<T> {
        Self::critical_section().thread_safe_init(get, init)
    }

    pub fn alloc(name: &str, n: usize) -> SyncResult<Arc<NamedSemaphore>> {
        SemaphoreRegistry::global().alloc(name, n)
    }

    pub fn free(name: &str) -> bool {
        SemaphoreRegistry::global().free(name)
    }

    pub fn get(name: &str, timeout: Option<Duration>, n: usize) -> SyncResult<bool> {
        SemaphoreRegistry::global().get(name, timeout, n)
    }

    pub async fn get_async(name: &str, timeout: Option<Duration>, n: usize) -> SyncResult<bool> {
        SemaphoreRegistry::global().get_async(name, timeout, n).await
    }

    pub fn release(name: &str) -> SyncResult<()> {
        SemaphoreRegistry::global().release(name)
    }
}
