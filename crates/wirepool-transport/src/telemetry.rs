//! Logging setup.
//!
//! The pool reports through `tracing`:
//!
//! | Level | Events |
//! |-------|--------|
//! | `DEBUG` | connect, disconnect, dials, dial failures |
//! | `TRACE` | checkouts, returns, evictions, idempotent no-ops |
//! | `WARN` | forced closes during shutdown, transport close failures |
//!
//! Every event carries the pool `address`; per-connection events add
//! `conn_id` and `generation`.
//!
//! Applications usually install their own subscriber. The helpers here are
//! for binaries and tests that just want readable output.

use thiserror::Error;
#[cfg(feature = "telemetry")]
use tracing::Level;

/// Target used by every pool event, for filtering.
pub const POOL_TARGET: &str = "wirepool::pool";

/// Errors from subscriber initialisation.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A filter directive failed to parse.
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Install a formatting subscriber logging at `level` and above.
#[cfg(feature = "telemetry")]
pub fn init_tracing(level: Level) -> Result<(), TelemetryError> {
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .parse("")
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}

/// Install a formatting subscriber configured from `RUST_LOG`.
///
/// Falls back to `wirepool=info` when `RUST_LOG` is unset.
#[cfg(feature = "telemetry")]
pub fn init_tracing_from_env() -> Result<(), TelemetryError> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("wirepool=info"))
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}
