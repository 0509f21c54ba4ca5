/*!
 * Dispose Lifecycle State
 *
 * Per-object state machine, sink registry and the disposal sequence
 *
 * The critical section orders the Live -> Disposing transition against sink
 * registration and may be held by callers across several calls. The sink
 * list's own mutex is only the `&self` mutability for that list: it is
 * locked inside the section, for one push/retain/clone, and never while a
 * sink runs.
 */

use super::traits::{Disposable, DisposeEventSink};
use super::{DisposeOrigin, DisposeState};
use crate::core::sync::{Concurrent, CriticalSection};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

static NEXT_LIFECYCLE_ID: AtomicU64 = AtomicU64::new(1);

#[inline]
fn same_sink(a: &Arc<dyn DisposeEventSink>, b: &Arc<dyn DisposeEventSink>) -> bool {
    // data pointers only: vtable addresses are not unique
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

pub struct DisposeLifecycle {
    id: u64,
    section: CriticalSection,
    state: AtomicU8,
    sinks: Mutex<Vec<Arc<dyn DisposeEventSink>>>,
}

impl Default for DisposeLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DisposeLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeLifecycle")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("sinks", &self.sinks.lock().len())
            .finish()
    }
}

impl DisposeLifecycle {
    pub fn new() -> Self {
        Self {
            id: NEXT_LIFECYCLE_ID.fetch_add(1, Ordering::Relaxed),
            section: CriticalSection::new(),
            state: AtomicU8::new(DisposeState::Live as u8),
            sinks: Mutex::new(Vec::new()),
        }
    }

    /// Process-unique identity, stable for the object's lifetime
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> DisposeState {
        DisposeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn sink_count(&self) -> usize {
        self.thread_safe(|| self.sinks.lock().len())
    }

    /// Register `sink`; registering the same sink twice has no effect
    pub fn advise(&self, sink: Arc<dyn DisposeEventSink>) {
        self.thread_safe(|| {
            let mut sinks = self.sinks.lock();
            if !sinks.iter().any(|s| same_sink(s, &sink)) {
                sinks.push(sink);
            }
        });
    }

    pub fn unadvise(&self, sink: &Arc<dyn DisposeEventSink>) -> bool {
        self.thread_safe(|| {
            let mut sinks = self.sinks.lock();
            let before = sinks.len();
            sinks.retain(|s| !same_sink(s, sink));
            sinks.len() != before
        })
    }

    fn snapshot(&self) -> Vec<Arc<dyn DisposeEventSink>> {
        self.thread_safe(|| self.sinks.lock().clone())
    }

    fn set_state(&self, state: DisposeState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Drive `source` through the disposal sequence
    ///
    /// Returns `false` without side effects unless this call wins the
    /// Live -> Disposing transition.
    pub(crate) fn run(&self, source: &dyn Disposable, origin: DisposeOrigin) -> bool {
        let won = self.atomic(
            || source.can_dispose() && self.state() == DisposeState::Live,
            || self.set_state(DisposeState::Disposing),
        );
        if !won {
            trace!(id = self.id, state = ?self.state(), "Dispose request ignored");
            return false;
        }

        debug!(id = self.id, ?origin, "Disposing");

        for sink in self.snapshot() {
            sink.notify_disposing(source);
        }

        if origin == DisposeOrigin::Explicit {
            source.dispose_managed();
        }
        source.dispose_unmanaged();

        self.set_state(DisposeState::Disposed);

        source.dispose_finally();

        for sink in self.snapshot() {
            sink.notify_disposed(source);
        }

        trace!(id = self.id, "Disposed");
        true
    }
}

impl Concurrent for DisposeLifecycle {
    type Family = DisposeLifecycle;

    fn critical_section(&self) -> &CriticalSection {
        &self.section
    }
}
