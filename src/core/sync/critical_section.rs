/*!
 * Critical Sections
 *
 * Re-entrant mutual exclusion with explicit enter/leave, RAII guards and a
 * type-indexed registry of family-wide locks.
 *
 * # Design: Owner + Depth Over Raw Re-entrant Mutex
 *
 * `parking_lot::ReentrantMutex` only releases through its guard, which makes
 * `leave()` on an unheld lock and `abort()` (drain every nested hold of the
 * calling thread) impossible to express safely. We track the owning thread
 * and the hold depth ourselves behind a small `parking_lot::Mutex`, and park
 * contended callers on a `Condvar` after a short adaptive spin.
 *
 * Lock-discipline mistakes (leaving a lock the caller does not hold) are
 * absorbed as no-ops so idempotent cleanup paths never fail.
 */

use super::config::SyncConfig;
use ahash::AHashMap;
use parking_lot::{Condvar, Mutex};
use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::LazyLock;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Spin iterations before switching from `spin_loop` to `yield_now`
const TIGHT_SPINS: u32 = 10;

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
    // bumped on every acquisition from unlocked; guards remember it
    epoch: u64,
}

impl Ownership {
    #[inline]
    fn try_claim(&mut self, me: ThreadId) -> bool {
        match self.owner {
            None => {
                self.owner = Some(me);
                self.depth = 1;
                self.epoch = self.epoch.wrapping_add(1);
                true
            }
            Some(owner) if owner == me => {
                self.depth += 1;
                true
            }
            Some(_) => false,
        }
    }
}

/// Re-entrant lock handle
///
/// The same thread may enter repeatedly; the lock is released once every
/// `enter` has been matched by a `leave` (or drained with `abort`).
#[derive(Debug)]
pub struct CriticalSection {
    state: Mutex<Ownership>,
    available: Condvar,
    spin_limit: u32,
}

impl Default for CriticalSection {
    fn default() -> Self {
        Self::new()
    }
}

impl CriticalSection {
    pub fn new() -> Self {
        Self::with_spin_limit(SyncConfig::default().spin_limit)
    }

    pub fn with_config(config: &SyncConfig) -> Self {
        Self::with_spin_limit(config.spin_limit)
    }

    pub fn with_spin_limit(spin_limit: u32) -> Self {
        Self {
            state: Mutex::new(Ownership {
                owner: None,
                depth: 0,
                epoch: 0,
            }),
            available: Condvar::new(),
            spin_limit,
        }
    }

    /// Lock shared by every member of family `F`
    ///
    /// Created on first request under a single bootstrap lock and never
    /// freed. Distinct families never contend with each other.
    pub fn for_type<F: ?Sized + 'static>() -> &'static CriticalSection {
        static FAMILY_LOCKS: LazyLock<Mutex<AHashMap<TypeId, &'static CriticalSection>>> =
            LazyLock::new(|| Mutex::new(AHashMap::new()));

        let mut locks = FAMILY_LOCKS.lock();
        *locks.entry(TypeId::of::<F>()).or_insert_with(|| {
            trace!(family = std::any::type_name::<F>(), "Creating family critical section");
            Box::leak(Box::new(CriticalSection::new()))
        })
    }

    /// Block until the calling thread holds the lock
    pub fn enter(&self) {
        let me = thread::current().id();
        let mut spins = 0u32;

        loop {
            let mut state = self.state.lock();
            if state.try_claim(me) {
                return;
            }

            if spins >= self.spin_limit {
                while !state.try_claim(me) {
                    self.available.wait(&mut state);
                }
                return;
            }
            drop(state);

            if spins < TIGHT_SPINS {
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
            spins += 1;
        }
    }

    /// Non-blocking attempt
    pub fn try_enter(&self) -> bool {
        self.state.lock().try_claim(thread::current().id())
    }

    /// Bounded attempt; `false` when `timeout` expires first
    pub fn try_enter_for(&self, timeout: Duration) -> bool {
        let me = thread::current().id();
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        while !state.try_claim(me) {
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return state.try_claim(me);
            }
        }
        true
    }

    /// Release one hold; returns `false` (and does nothing) if the calling
    /// thread does not hold the lock
    pub fn leave(&self) -> bool {
        self.leave_within(None)
    }

    /// Release one hold, but only while the current ownership epoch is
    /// `epoch` (when given)
    fn leave_within(&self, epoch: Option<u64>) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner != Some(me) {
            debug!("Ignoring leave() on a critical section not held by this thread");
            return false;
        }
        if epoch.is_some_and(|epoch| epoch != state.epoch) {
            trace!("Ignoring stale guard from an earlier hold");
            return false;
        }

        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            self.available.notify_one();
        }
        true
    }

    /// Drain every nested hold of the calling thread; returns how many holds
    /// were released
    pub fn abort(&self) -> usize {
        let me = thread::current().id();
        let mut state = self.state.lock();

        if state.owner != Some(me) {
            return 0;
        }

        let drained = std::mem::take(&mut state.depth);
        state.owner = None;
        self.available.notify_one();
        trace!(drained, "Aborted critical section");
        drained
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.state.lock().owner == Some(thread::current().id())
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().owner.is_some()
    }

    /// Hold depth of the calling thread (0 when not held)
    pub fn depth(&self) -> usize {
        let state = self.state.lock();
        if state.owner == Some(thread::current().id()) {
            state.depth
        } else {
            0
        }
    }

    /// Enter and return a guard that leaves on drop
    pub fn enter_guard(&self) -> CriticalSectionGuard<'_> {
        self.enter();
        self.held_guard()
    }

    pub fn try_enter_guard(&self) -> Option<CriticalSectionGuard<'_>> {
        self.try_enter().then(|| self.held_guard())
    }

    /// Guard for a hold the calling thread has just taken
    fn held_guard(&self) -> CriticalSectionGuard<'_> {
        CriticalSectionGuard {
            section: self,
            epoch: self.state.lock().epoch,
            _not_send: PhantomData,
        }
    }

    /// Run `f` with the lock held for its whole duration
    ///
    /// The lock is released before a panic in `f` continues unwinding.
    pub fn thread_safe<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.enter_guard();
        f()
    }

    /// Check-then-act under one acquisition; returns the outcome of `test`
    pub fn atomic(&self, test: impl FnOnce() -> bool, action: impl FnOnce()) -> bool {
        self.atomic_else(test, action, || {})
    }

    pub fn atomic_else(
        &self,
        test: impl FnOnce() -> bool,
        action: impl FnOnce(),
        action_else: impl FnOnce(),
    ) -> bool {
        let _guard = self.enter_guard();
        let success = test();
        if success {
            action();
        } else {
            action_else();
        }
        success
    }

    /// Double-checked lazy initialization
    ///
    /// `get` is first called without the lock; only when it yields nothing is
    /// the lock taken, `get` re-checked and `init` run. Racing callers
    /// therefore run `init` at most once as long as `init` makes `get`
    /// succeed.
    pub fn thread_safe_init<T>(
        &self,
        get: impl Fn() -> Option<T>,
        init: impl FnOnce(),
    ) -> Option<T> {
        if let Some(value) = get() {
            return Some(value);
        }

        let _guard = self.enter_guard();
        if let Some(value) = get() {
            return Some(value);
        }
        init();
        get()
    }
}

/// RAII hold on a [`CriticalSection`]
///
/// Bound to the thread that created it. A guard only releases holds of the
/// ownership period it was created in: once `abort()` (or unbalanced
/// `leave()` calls) has unlocked the section, dropping the guard is a no-op,
/// even if the thread has entered the section again since.
#[must_use = "the critical section is left as soon as the guard is dropped"]
pub struct CriticalSectionGuard<'a> {
    section: &'a CriticalSection,
    epoch: u64,
    _not_send: PhantomData<*const ()>,
}

impl CriticalSectionGuard<'_> {
    pub fn section(&self) -> &CriticalSection {
        self.section
    }
}

impl Drop for CriticalSectionGuard<'_> {
    fn drop(&mut self) {
        self.section.leave_within(Some(self.epoch));
    }
}
