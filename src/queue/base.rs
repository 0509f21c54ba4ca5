/*!
 * Base Priority Queue
 * Ordered priority -> item map with a reverse key -> priority index
 *
 * # Design: Section Outside, Mutex Inside
 *
 * The queue's [`CriticalSection`] is the lock callers see: it is re-entrant,
 * so a compound operation (`q.atomic(|| !q.contains(&x), || ...)`) can call
 * back into the queue while holding it. The inner `parking_lot::Mutex` only
 * turns `&self` into `&mut QueueState` without `unsafe`. It is taken
 * strictly inside the section and released before any call returns, so it
 * is never contended and never held across a re-entrant call.
 */

use crate::core::errors::{QueueError, QueueResult};
use crate::core::sync::{Concurrent, CriticalSection, Synchronized};
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use tracing::trace;

type KeyFn<T, K> = Box<dyn Fn(&T) -> K + Send + Sync>;

struct Entry<T, K> {
    key: K,
    item: T,
}

struct QueueState<T, P, K> {
    items_by_priority: BTreeMap<P, Entry<T, K>>,
    item_priority: HashMap<K, P, RandomState>,
    head: Option<T>,
}

impl<T: Clone, P: Ord, K> QueueState<T, P, K> {
    #[inline]
    fn refresh_head(&mut self) {
        self.head = self
            .items_by_priority
            .first_key_value()
            .map(|(_, entry)| entry.item.clone());
    }
}

/// Thread-safe priority queue with key-based re-prioritization
///
/// Items are identified by a key derived from the item (the item itself by
/// default). At most one entry exists per key: enqueuing a present key moves
/// it to its new priority. Two distinct keys may never share a priority.
///
/// All operations are serialized by the queue's critical section, which the
/// queue exposes through [`Concurrent`] so callers can group several
/// operations atomically. Enqueuing is left to the wrappers
/// ([`PriorityQueue`](super::PriorityQueue),
/// [`PunisherQueue`](super::PunisherQueue)) that decide where priorities
/// come from.
pub struct BasePriorityQueue<T, P, K = T> {
    section: CriticalSection,
    state: Mutex<QueueState<T, P, K>>,
    item_key: KeyFn<T, K>,
}

impl<T, P> BasePriorityQueue<T, P, T>
where
    T: Clone + Hash + Eq + 'static,
    P: Ord + Clone,
{
    pub fn new() -> Self {
        Self::with_key(T::clone)
    }
}

impl<T, P> Default for BasePriorityQueue<T, P, T>
where
    T: Clone + Hash + Eq + 'static,
    P: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, K> BasePriorityQueue<T, P, K>
where
    T: Clone,
    P: Ord + Clone,
    K: Hash + Eq + Clone,
{
    /// Queue whose entries are identified by `item_key(item)`
    pub fn with_key(item_key: impl Fn(&T) -> K + Send + Sync + 'static) -> Self {
        Self {
            section: CriticalSection::new(),
            state: Mutex::new(QueueState {
                items_by_priority: BTreeMap::new(),
                item_priority: HashMap::with_hasher(RandomState::new()),
                head: None,
            }),
            item_key: Box::new(item_key),
        }
    }

    pub(crate) fn enqueue_with_priority(&self, item: T, priority: P) -> QueueResult<()> {
        let key = (self.item_key)(&item);

        self.thread_safe(|| {
            let mut state = self.state.lock();

            if let Some(existing) = state.items_by_priority.get(&priority) {
                if existing.key != key {
                    return Err(QueueError::PriorityConflict);
                }
            }

            if let Some(stale) = state.item_priority.remove(&key) {
                state.items_by_priority.remove(&stale);
                trace!("Re-prioritizing queued item");
            }

            state.item_priority.insert(key.clone(), priority.clone());
            state.items_by_priority.insert(priority, Entry { key, item });
            state.refresh_head();
            Ok(())
        })
    }

    pub fn len(&self) -> usize {
        self.thread_safe(|| self.state.lock().item_priority.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, item: &T) -> bool {
        let key = (self.item_key)(item);
        self.thread_safe(|| self.state.lock().item_priority.contains_key(&key))
    }

    pub fn priority_of(&self, item: &T) -> Option<P> {
        let key = (self.item_key)(item);
        self.thread_safe(|| self.state.lock().item_priority.get(&key).cloned())
    }

    /// Minimum-priority item, if any
    pub fn try_peek(&self) -> Option<T> {
        self.thread_safe(|| self.state.lock().head.clone())
    }

    pub fn peek(&self) -> QueueResult<T> {
        self.try_peek().ok_or(QueueError::Empty)
    }

    /// Remove and return the minimum-priority item, if any
    pub fn try_dequeue(&self) -> Option<T> {
        self.thread_safe(|| {
            let mut state = self.state.lock();
            let (_, entry) = state.items_by_priority.pop_first()?;
            state.item_priority.remove(&entry.key);
            state.refresh_head();
            Some(entry.item)
        })
    }

    pub fn dequeue(&self) -> QueueResult<T> {
        self.try_dequeue().ok_or(QueueError::Empty)
    }

    /// Remove the entry sharing `item`'s key; `false` if none was queued
    pub fn remove(&self, item: &T) -> bool {
        let key = (self.item_key)(item);
        self.thread_safe(|| {
            let mut state = self.state.lock();
            let Some(priority) = state.item_priority.remove(&key) else {
                return false;
            };
            state.items_by_priority.remove(&priority);
            state.refresh_head();
            true
        })
    }

    pub fn clear(&self) {
        self.thread_safe(|| {
            let mut state = self.state.lock();
            state.items_by_priority.clear();
            state.item_priority.clear();
            state.head = None;
        });
    }

    /// Snapshot of the queued items in ascending priority order
    pub fn items(&self) -> Vec<T> {
        self.thread_safe(|| {
            self.state
                .lock()
                .items_by_priority
                .values()
                .map(|entry| entry.item.clone())
                .collect()
        })
    }
}

impl<T, P, K> Concurrent for BasePriorityQueue<T, P, K> {
    type Family = Synchronized;

    fn critical_section(&self) -> &CriticalSection {
        &self.section
    }
}

impl<T, P, K> fmt::Debug for BasePriorityQueue<T, P, K>
where
    T: fmt::Debug,
    P: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_map()
            .entries(
                state
                    .items_by_priority
                    .iter()
                    .map(|(priority, entry)| (priority, &entry.item)),
            )
            .finish()
    }
}
