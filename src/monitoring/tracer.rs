/*!
 * Structured Tracing
 * Subscriber setup for binaries and tests that embed the toolkit
 */

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Set to `1` or `true` for JSON lines instead of compact text
pub const ENV_TRACE_JSON: &str = "VSTOOLS_TRACE_JSON";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Install a global subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once; returns `false` if a subscriber was already
/// installed, by this function or by the host application.
pub fn init_tracing() -> bool {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return false;
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if json_requested() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!("Tracing initialized");
    }
    installed
}

fn json_requested() -> bool {
    std::env::var(ENV_TRACE_JSON)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
