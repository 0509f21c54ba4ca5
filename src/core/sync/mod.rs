/*!
 * Synchronization Primitives
 *
 * Building blocks for code that shares mutable state across caller threads:
 * - Re-entrant critical sections, instance- or family-scoped
 * - A process-wide named counting-semaphore registry
 * - Strictly monotonic timestamps
 * - Once-only lazy initialization
 * - A single-slot exclusive hand-off
 *
 * # Architecture
 *
 * Nothing here owns a thread or schedules work. Every operation runs on the
 * calling thread; the only designed blocking points are semaphore
 * acquisition (`get` blocks, `get_async` suspends) and contended lock entry.
 * Critical sections are meant for brief, non-blocking work and must not be
 * held across an `.await`.
 */

mod concurrent;
mod config;
mod critical_section;
mod exclusive;
mod lazy;
mod semaphore;
mod synchronized;
mod timestamp;

pub use concurrent::Concurrent;
pub use config::{SyncConfig, ENV_DEFAULT_WAIT_MS, ENV_REGISTRY_SHARDS, ENV_SPIN_LIMIT};
pub use critical_section::{CriticalSection, CriticalSectionGuard};
pub use exclusive::Exclusive;
pub use lazy::LazyFactory;
pub use semaphore::{NamedSemaphore, SemaphoreRegistry};
pub use synchronized::Synchronized;
pub use timestamp::{ClockSource, MonotonicClock, Timestamp};
