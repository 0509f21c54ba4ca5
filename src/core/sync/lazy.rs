/*!
 * Lazy Factory
 * Memoized, thread-safe once-only initialization of named properties
 */

use ahash::RandomState;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock};
use tracing::trace;

type Cell = Arc<OnceLock<Arc<dyn Any + Send + Sync>>>;

/// Memoizes values by `(type, key)`
///
/// `get` runs its initializer at most once per key, even when several
/// threads race on the first access; losers block until the winner's value
/// is available. Initializers run outside the map's shard locks, so an
/// initializer may itself call `get` for another key.
///
/// # Example
///
/// ```
/// use vstools_sync::core::sync::LazyFactory;
///
/// let lazy = LazyFactory::new();
/// let table = lazy.get("versions", || vec!["6.5", "6.8"]);
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Default)]
pub struct LazyFactory {
    cells: DashMap<(TypeId, &'static str), Cell, RandomState>,
}

impl LazyFactory {
    pub fn new() -> Self {
        Self {
            cells: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn get<T>(&self, key: &'static str, init: impl FnOnce() -> T) -> Arc<T>
    where
        T: Any + Send + Sync,
    {
        let cell: Cell = self
            .cells
            .entry((TypeId::of::<T>(), key))
            .or_default()
            .clone();

        let value = cell
            .get_or_init(|| {
                trace!(key, ty = type_name::<T>(), "Initializing lazy property");
                Arc::new(init()) as Arc<dyn Any + Send + Sync>
            })
            .clone();

        match value.downcast::<T>() {
            Ok(value) => value,
            // cells are keyed by TypeId::of::<T>()
            Err(_) => unreachable!("lazy cell '{key}' holds a value of another type"),
        }
    }

    pub fn is_initialized<T: Any>(&self, key: &'static str) -> bool {
        self.cells
            .get(&(TypeId::of::<T>(), key))
            .is_some_and(|cell| cell.get().is_some())
    }

    /// Forget the memoized value; the next `get` initializes again
    ///
    /// Holders of a previously returned `Arc` keep their value.
    pub fn reset<T: Any>(&self, key: &'static str) -> bool {
        self.cells.remove(&(TypeId::of::<T>(), key)).is_some()
    }
}
