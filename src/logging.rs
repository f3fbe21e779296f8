//! Logging and tracing infrastructure.
//!
//! Non-fatal load diagnostics (duplicate functions, unresolved call targets,
//! truncated decompiled blocks) are emitted as `tracing` events; installing a
//! subscriber is left to the embedding program through the helpers below.

use std::sync::Once;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

static INIT: Once = Once::new();

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Subsequent calls are ignored.
pub fn init_tracing() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        match tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init()
        {
            Ok(()) => info!("program-model tracing initialized"),
            Err(e) => warn!(error = %e, "Global subscriber already set, keeping it"),
        }
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        match tracing_subscriber::registry()
            .with(env_filter())
            .with(fmt_layer)
            .try_init()
        {
            Ok(()) => info!("program-model tracing initialized (JSON mode)"),
            Err(e) => warn!(error = %e, "Global subscriber already set, keeping it"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, warn};

    #[test]
    fn test_init_tracing_once() {
        init_tracing();
        init_tracing();
        init_tracing_json();
    }

    #[test]
    fn test_structured_logging() {
        init_tracing();
        let call_target = "FUN_00401000";
        warn!(call_target, address = 0x401000u32, "Could not resolve call target");
        debug!(count = 3, "Loaded enums");
    }
}
