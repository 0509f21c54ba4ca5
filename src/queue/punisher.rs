/*!
 * Punisher Queue
 *
 * FIFO where touching an item sends it to the back of the line.
 *
 * Every enqueue stamps the item with a fresh [`Timestamp`], so a re-queued
 * item lands strictly behind everything currently queued. Retry loops use it
 * to keep repeatedly-failing work from starving fresh arrivals.
 */

use super::base::BasePriorityQueue;
use crate::core::errors::{QueueError, QueueResult};
use crate::core::sync::{Concurrent, Timestamp};
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Arc;
use tracing::error;

pub struct PunisherQueue<T, K = T> {
    inner: BasePriorityQueue<T, i64, K>,
    clock: Arc<Timestamp>,
}

impl<T> PunisherQueue<T, T>
where
    T: Clone + Hash + Eq + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: BasePriorityQueue::new(),
            clock: Timestamp::global(),
        }
    }
}

impl<T> Default for PunisherQueue<T, T>
where
    T: Clone + Hash + Eq + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> PunisherQueue<T, K>
where
    T: Clone,
    K: Hash + Eq + Clone,
{
    /// Queue whose entries are identified by `item_key(item)`, e.g. a
    /// project path shared by several tracker objects
    pub fn with_key(item_key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            inner: BasePriorityQueue::with_key(item_key),
            clock: Timestamp::global(),
        }
    }

    /// Stamp priorities from `clock` instead of the process-wide generator
    pub fn with_timestamp(mut self, clock: Arc<Timestamp>) -> Self {
        self.clock = clock;
        self
    }

    /// Append `item`, or move it to the back if its key is already queued
    ///
    /// The stamp is drawn while the queue's critical section is held, so
    /// stamp order always matches insertion order. Fails with
    /// `PriorityExhausted` (leaving the queue untouched) once the timestamp
    /// source has no larger value to hand out.
    pub fn enqueue(&self, item: T) -> QueueResult<()> {
        self.inner.thread_safe(|| {
            let stamp = self.clock.try_next_value().map_err(|err| {
                error!(%err, "Cannot stamp punisher queue item");
                QueueError::PriorityExhausted
            })?;
            self.inner.enqueue_with_priority(item, stamp)
        })
    }
}

impl<T, K> Deref for PunisherQueue<T, K> {
    type Target = BasePriorityQueue<T, i64, K>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
