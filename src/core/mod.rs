/*!
 * Core Module
 * Synchronization primitives, dispose lifecycle and error types
 */

pub mod dispose;
pub mod errors;
pub mod sync;

// Re-export for convenience
pub use errors::*;
