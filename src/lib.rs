/*!
 * VS Tools Sync
 *
 * Concurrency toolkit for long-lived, multi-threaded host processes:
 * re-entrant critical sections, a named-semaphore registry, monotonic
 * timestamps, lazy singletons, exclusive slots, a two-phase dispose
 * lifecycle and thread-safe priority queues.
 */

pub mod core;
pub mod monitoring;
pub mod queue;

// Re-exports
pub use crate::core::dispose::{
    Disposable, DisposeEventSink, DisposeLifecycle, DisposeOrigin, DisposeState, Finalizable,
};
pub use crate::core::errors::{QueueError, QueueResult, SyncError, SyncResult};
pub use crate::core::sync::{
    Concurrent, CriticalSection, CriticalSectionGuard, Exclusive, LazyFactory, NamedSemaphore,
    SemaphoreRegistry, SyncConfig, Synchronized, Timestamp,
};
pub use monitoring::init_tracing;
pub use queue::{BasePriorityQueue, PriorityQueue, PunisherQueue};
