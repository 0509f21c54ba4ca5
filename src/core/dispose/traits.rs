/*!
 * Dispose Traits
 *
 * Hooks implemented by disposable objects and by their observers
 */

use super::lifecycle::DisposeLifecycle;
use super::{DisposeOrigin, DisposeState};
use std::sync::Arc;

/// Observer of another object's disposal
///
/// # Panics
///
/// Should NOT panic: a panicking sink aborts the teardown of the source.
pub trait DisposeEventSink: Send + Sync {
    fn notify_disposing(&self, source: &dyn Disposable);

    fn notify_disposed(&self, source: &dyn Disposable);
}

/// Objects with an at-most-once teardown
///
/// Implementors provide the [`DisposeLifecycle`] and override the hooks they
/// need; callers use [`dispose`](Disposable::dispose).
pub trait Disposable {
    fn lifecycle(&self) -> &DisposeLifecycle;

    /// While `false`, disposal is blocked and `dispose` is a no-op
    fn can_dispose(&self) -> bool {
        true
    }

    /// Release references to other managed collaborators
    ///
    /// Skipped when disposal originates from a finalizer.
    fn dispose_managed(&self) {}

    /// Release native handles; always runs
    fn dispose_unmanaged(&self) {}

    /// Runs once the object is marked disposed, before `notify_disposed`
    fn dispose_finally(&self) {}

    /// Idempotent entry point; returns whether this call performed the
    /// teardown
    fn dispose(&self) -> bool
    where
        Self: Sized,
    {
        self.dispose_from(DisposeOrigin::Explicit)
    }

    fn dispose_from(&self, origin: DisposeOrigin) -> bool
    where
        Self: Sized,
    {
        self.lifecycle().run(self, origin)
    }

    fn dispose_state(&self) -> DisposeState {
        self.lifecycle().state()
    }

    fn is_disposing(&self) -> bool {
        self.dispose_state() == DisposeState::Disposing
    }

    fn is_disposed(&self) -> bool {
        self.dispose_state() == DisposeState::Disposed
    }

    fn advise_dispose(&self, sink: Arc<dyn DisposeEventSink>) {
        self.lifecycle().advise(sink);
    }

    fn unadvise_dispose(&self, sink: &Arc<dyn DisposeEventSink>) -> bool {
        self.lifecycle().unadvise(sink)
    }
}
