/*!
 * Monitoring
 * Tracing setup; the toolkit itself only emits `tracing` events
 */

mod tracer;

pub use tracer::{init_tracing, ENV_TRACE_JSON};
