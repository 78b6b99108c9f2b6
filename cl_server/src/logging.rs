//! Structured logging configuration.
//!
//! The library logs through the `log` facade; `tracing-subscriber` picks those
//! records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use cl_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log an API request that failed
///
/// Client errors log at debug, server errors at error with the full cause.
pub fn log_api_error(operation: &str, status_code: u16, detail: &str) {
    if status_code >= 500 {
        tracing::error!(
            operation = operation,
            http_status = status_code,
            "API request failed: {}",
            detail
        );
    } else {
        tracing::debug!(
            operation = operation,
            http_status = status_code,
            "API request rejected: {}",
            detail
        );
    }
}

/// Log performance metric
///
/// Operations slower than a second are logged as warnings.
pub fn log_performance(operation: &str, duration_ms: u64, metadata: Option<&str>) {
    if duration_ms > 1000 {
        tracing::warn!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "PERFORMANCE: Slow operation"
        );
    } else {
        tracing::debug!(
            operation = operation,
            duration_ms = duration_ms,
            metadata = metadata,
            "Performance metric"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_log_performance() {
        log_performance("standings_recompute", 5, Some("group 3"));
        log_performance("fixture_generation", 2000, None);
    }

    #[test]
    fn test_log_api_error() {
        log_api_error("record_match_result", 409, "invalid transition");
        log_api_error("get_standings", 500, "connection reset");
    }
}
