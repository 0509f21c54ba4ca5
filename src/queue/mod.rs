/*!
 * Priority Queues
 *
 * Thread-safe control queues ordered by a comparable priority:
 * - **BasePriorityQueue**: shared machinery (ordered map + key index + cached head)
 * - **PriorityQueue**: caller-assigned priorities
 * - **PunisherQueue**: timestamp priorities; re-queued items go to the back
 *
 * These are coarse-grained, one-lock-per-queue structures for pending and
 * retried work, not data-plane queues.
 */

mod base;
mod priority;
mod punisher;

pub use base::BasePriorityQueue;
pub use priority::PriorityQueue;
pub use punisher::PunisherQueue;
