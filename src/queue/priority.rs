/*!
 * Priority Queue
 * Caller-assigned priorities, lowest value first
 */

use super::base::BasePriorityQueue;
use crate::core::errors::QueueResult;
use std::hash::Hash;
use std::ops::Deref;

/// [`BasePriorityQueue`] with a public, caller-supplied priority
///
/// Ordering is "ascending by priority value" and nothing more: fairness, if
/// any, is the caller's business.
pub struct PriorityQueue<T, P, K = T> {
    inner: BasePriorityQueue<T, P, K>,
}

impl<T, P> PriorityQueue<T, P, T>
where
    T: Clone + Hash + Eq + 'static,
    P: Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: BasePriorityQueue::new(),
        }
    }
}

impl<T, P> Default for PriorityQueue<T, P, T>
where
    T: Clone + Hash + Eq + 'static,
    P: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, K> PriorityQueue<T, P, K>
where
    T: Clone,
    P: Ord + Clone,
    K: Hash + Eq + Clone,
{
    pub fn with_key(item_key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            inner: BasePriorityQueue::with_key(item_key),
        }
    }

    /// Queue `item` at `priority`, replacing any entry with the same key
    ///
    /// Fails with `PriorityConflict` if another item already holds
    /// `priority`.
    pub fn enqueue(&self, item: T, priority: P) -> QueueResult<()> {
        self.inner.enqueue_with_priority(item, priority)
    }
}

impl<T, P, K> Deref for PriorityQueue<T, P, K> {
    type Target = BasePriorityQueue<T, P, K>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
