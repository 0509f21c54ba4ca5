/*!
 * Error Types
 * Centralized error handling with thiserror and miette diagnostics
 */

use miette::Diagnostic;
use thiserror::Error;

/// Named-semaphore registry errors
///
/// Timeouts are deliberately absent: a bounded wait that expires is an
/// ordinary outcome and is reported as `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SyncError {
    #[error("Semaphore '{0}' not found")]
    #[diagnostic(
        code(sync::semaphore_not_found),
        help("Call alloc() with the same name before acquiring or releasing permits.")
    )]
    SemaphoreNotFound(String),

    #[error("Semaphore '{0}' was freed while waiting")]
    #[diagnostic(
        code(sync::semaphore_closed),
        help("The resource was freed by another caller. Re-allocate it if it is still needed.")
    )]
    SemaphoreClosed(String),

    #[error("Invalid semaphore capacity: {0}")]
    #[diagnostic(
        code(sync::invalid_capacity),
        help("A named semaphore needs a capacity of at least one permit.")
    )]
    InvalidCapacity(usize),

    #[error("Timestamp generator exhausted")]
    #[diagnostic(
        code(sync::timestamp_exhausted),
        help("The last issued timestamp is i64::MAX; no larger unique value exists. Check the clock source.")
    )]
    TimestampExhausted,
}

/// Priority queue usage errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum QueueError {
    #[error("Queue is empty")]
    #[diagnostic(
        code(queue::empty),
        help("Use try_peek()/try_dequeue() when the queue may legitimately be empty.")
    )]
    Empty,

    #[error("An item with the same priority exists")]
    #[diagnostic(
        code(queue::priority_conflict),
        help("Two distinct items can never share a priority value. Pick a unique priority.")
    )]
    PriorityConflict,

    #[error("No unique priority left to assign")]
    #[diagnostic(
        code(queue::priority_exhausted),
        help("The queue's timestamp source is exhausted. The item was not queued.")
    )]
    PriorityExhausted,
}

/// Result type for synchronization primitives
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;
