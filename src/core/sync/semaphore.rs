/*!
 * Named Semaphore Registry
 *
 * Process-wide map of counting semaphores keyed by resource name.
 *
 * # Design: Per-Semaphore State Over One Registry Lock
 *
 * The registry is a sharded `DashMap`, so unrelated names never contend on a
 * common lock (nor on any critical section). Each semaphore carries its own
 * `parking_lot` mutex/condvar pair for blocking waiters and a
 * `tokio::sync::Notify` for suspended async waiters; every release signals
 * both, and woken waiters re-check the permit count before claiming it.
 *
 * `free` closes the semaphore it removes: waiters still parked on it (and
 * any caller holding a stale `Arc`) observe `SemaphoreClosed` instead of
 * waiting forever.
 */

use super::config::SyncConfig;
use crate::core::errors::{SyncError, SyncResult};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::pin::pin;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

#[derive(Debug)]
struct Permits {
    available: usize,
    closed: bool,
}

/// Counting semaphore registered under a name
#[derive(Debug)]
pub struct NamedSemaphore {
    name: String,
    capacity: usize,
    permits: Mutex<Permits>,
    released: Condvar,
    released_async: Notify,
}

impl NamedSemaphore {
    fn new(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            capacity,
            permits: Mutex::new(Permits {
                available: capacity,
                closed: false,
            }),
            released: Condvar::new(),
            released_async: Notify::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.permits.lock().available
    }

    pub fn is_closed(&self) -> bool {
        self.permits.lock().closed
    }

    #[inline]
    fn claim(&self, permits: &mut Permits) -> SyncResult<bool> {
        if permits.closed {
            return Err(SyncError::SemaphoreClosed(self.name.clone()));
        }
        if permits.available > 0 {
            permits.available -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    /// Take a permit if one is free right now
    pub fn try_acquire(&self) -> SyncResult<bool> {
        self.claim(&mut self.permits.lock())
    }

    /// Block the calling thread until a permit is free
    ///
    /// With `Some(timeout)` returns `Ok(false)` once the timeout expires.
    pub fn acquire(&self, timeout: Option<Duration>) -> SyncResult<bool> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut permits = self.permits.lock();

        loop {
            if self.claim(&mut permits)? {
                return Ok(true);
            }

            match deadline {
                None => self.released.wait(&mut permits),
                Some(deadline) => {
                    if self.released.wait_until(&mut permits, deadline).timed_out() {
                        let acquired = self.claim(&mut permits)?;
                        if !acquired {
                            debug!(semaphore = %self.name, "Semaphore wait timed out");
                        }
                        return Ok(acquired);
                    }
                }
            }
        }
    }

    /// Suspend until a permit is free without blocking the worker thread
    pub async fn acquire_async(&self, timeout: Option<Duration>) -> SyncResult<bool> {
        let wait = async {
            loop {
                let mut notified = pin!(self.released_async.notified());
                notified.as_mut().enable();

                if self.try_acquire()? {
                    return Ok(true);
                }
                notified.await;
            }
        };

        match timeout {
            None => wait.await,
            Some(timeout) => match tokio::time::timeout(timeout, wait).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(semaphore = %self.name, "Async semaphore wait timed out");
                    Ok(false)
                }
            },
        }
    }

    /// Return one permit; a release that would exceed capacity is ignored
    pub fn release(&self) -> bool {
        let mut permits = self.permits.lock();

        if permits.closed {
            return false;
        }
        if permits.available >= self.capacity {
            warn!(
                semaphore = %self.name,
                capacity = self.capacity,
                "Ignoring release of a semaphore with no outstanding permits"
            );
            return false;
        }

        permits.available += 1;
        drop(permits);

        self.released.notify_one();
        self.released_async.notify_one();
        true
    }

    fn close(&self) {
        self.permits.lock().closed = true;
        self.released.notify_all();
        self.released_async.notify_waiters();
    }
}

static GLOBAL_REGISTRY: LazyLock<SemaphoreRegistry> =
    LazyLock::new(|| SemaphoreRegistry::with_config(&SyncConfig::from_env()));

/// Name → semaphore registry
pub struct SemaphoreRegistry {
    semaphores: DashMap<String, Arc<NamedSemaphore>, RandomState>,
    default_wait: Option<Duration>,
}

impl Default for SemaphoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SemaphoreRegistry {
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        let config = config.clone().normalized();
        Self {
            semaphores: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                config.registry_shards,
            ),
            default_wait: config.default_wait,
        }
    }

    /// Registry shared by the whole process
    pub fn global() -> &'static SemaphoreRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register `name` with capacity `n`
    ///
    /// Idempotent: an existing registration keeps its original capacity.
    /// Returns the registered semaphore.
    pub fn alloc(&self, name: &str, n: usize) -> SyncResult<Arc<NamedSemaphore>> {
        if n == 0 {
            return Err(SyncError::InvalidCapacity(n));
        }

        if let Some(existing) = self.semaphores.get(name) {
            return Ok(existing.clone());
        }

        let semaphore = self
            .semaphores
            .entry(name.to_string())
            .or_insert_with(|| {
                trace!(semaphore = name, capacity = n, "Allocated named semaphore");
                Arc::new(NamedSemaphore::new(name, n))
            })
            .clone();
        Ok(semaphore)
    }

    /// Remove and close `name`; returns whether it was registered
    ///
    /// Callers must not hold outstanding permits: ownership is not tracked.
    pub fn free(&self, name: &str) -> bool {
        match self.semaphores.remove(name) {
            Some((_, semaphore)) => {
                semaphore.close();
                trace!(semaphore = name, "Freed named semaphore");
                true
            }
            None => false,
        }
    }

    /// Block until a permit of `name` is free, allocating it with capacity
    /// `n` on first use
    ///
    /// `timeout: None` waits forever; otherwise `Ok(false)` on expiry.
    pub fn get(&self, name: &str, timeout: Option<Duration>, n: usize) -> SyncResult<bool> {
        self.alloc(name, n)?.acquire(timeout)
    }

    /// `get` with the configured default wait and a single-permit capacity
    pub fn get_default(&self, name: &str) -> SyncResult<bool> {
        self.get(name, self.default_wait, 1)
    }

    /// Suspending form of [`get`](Self::get)
    pub async fn get_async(
        &self,
        name: &str,
        timeout: Option<Duration>,
        n: usize,
    ) -> SyncResult<bool> {
        let semaphore = self.alloc(name, n)?;
        semaphore.acquire_async(timeout).await
    }

    /// Return a permit of `name`
    ///
    /// Releasing beyond capacity is absorbed; an unknown name is an error.
    pub fn release(&self, name: &str) -> SyncResult<()> {
        let semaphore = self.lookup(name)?;
        semaphore.release();
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.semaphores.contains_key(name)
    }

    pub fn available(&self, name: &str) -> Option<usize> {
        self.semaphores.get(name).map(|s| s.available())
    }

    pub fn capacity(&self, name: &str) -> Option<usize> {
        self.semaphores.get(name).map(|s| s.capacity())
    }

    pub fn len(&self) -> usize {
        self.semaphores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semaphores.is_empty()
    }

    fn lookup(&self, name: &str) -> SyncResult<Arc<NamedSemaphore>> {
        self.semaphores
            .get(name)
            .map(|s| s.clone())
            .ok_or_else(|| SyncError::SemaphoreNotFound(name.to_string()))
    }
}
