/*!
 * Dispose Lifecycle
 *
 * Thread-safe, idempotent two-phase teardown with observer notification.
 *
 * ## State Machine
 *
 * ```text
 * Live --[can_dispose && Live]--> Disposing --[managed*, unmanaged]--> Disposed
 * ```
 *
 * `*` managed teardown runs only for explicit disposal, never from
 * [`Finalizable`]'s drop path.
 *
 * 1. The Live -> Disposing transition is a check-then-act under the object's
 *    critical section: exactly one caller wins, every other call is a no-op.
 * 2. Sinks get `notify_disposing` before teardown and `notify_disposed`
 *    after, each from a snapshot of the sink set, so a sink may advise or
 *    unadvise (itself included) from inside a callback.
 *
 * ## Example
 *
 * ```
 * use vstools_sync::core::dispose::{Disposable, DisposeLifecycle};
 *
 * struct Relay {
 *     lifecycle: DisposeLifecycle,
 * }
 *
 * impl Disposable for Relay {
 *     fn lifecycle(&self) -> &DisposeLifecycle {
 *         &self.lifecycle
 *     }
 * }
 *
 * let relay = Relay { lifecycle: DisposeLifecycle::new() };
 * assert!(relay.dispose());
 * assert!(!relay.dispose());
 * assert!(relay.is_disposed());
 * ```
 */

mod finalizable;
mod lifecycle;
mod traits;

pub use finalizable::Finalizable;
pub use lifecycle::DisposeLifecycle;
pub use traits::{Disposable, DisposeEventSink};

/// Lifecycle state; transitions only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum DisposeState {
    Live = 0,
    Disposing = 1,
    Disposed = 2,
}

impl DisposeState {
    #[inline]
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => DisposeState::Live,
            1 => DisposeState::Disposing,
            _ => DisposeState::Disposed,
        }
    }
}

/// What triggered a disposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeOrigin {
    /// `dispose()` called by the owner: managed collaborators are released
    Explicit,
    /// Drop of a [`Finalizable`]: only unmanaged resources are released
    Finalizer,
}
