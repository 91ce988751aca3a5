//! Structured-logging bootstrap for Berth.
//!
//! The ledgers emit paired trace events (starting/finished) around every
//! store round trip and distinct warn events per lost-race class, all
//! carrying the scope fields. This module only wires up the subscriber;
//! hosts that install their own subscriber can skip it entirely.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs (for production).
    Json,
    /// Pretty-printed logs (for development).
    #[default]
    Pretty,
}

/// Initializes the logging subsystem.
///
/// Call once at startup; subsequent calls are no-ops. Levels come from
/// `RUST_LOG` (e.g. `info`, `berth_cluster=trace`), defaulting to `info`.
///
/// # Example
///
/// ```rust
/// use berth_core::observability::{init_logging, LogFormat};
///
/// init_logging(LogFormat::Pretty);
/// ```
pub fn init_logging(format: LogFormat) {
    INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        match format {
            LogFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            }
            LogFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
        }
    });
}
