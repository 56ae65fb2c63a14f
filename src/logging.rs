// Logging module for structured logging using the tracing crate

use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for structured logging
///
/// The breaker itself only emits events (state transitions, deduplicated
/// fail-fast warnings); installing a subscriber is the embedding
/// application's choice. This helper wires up the common shape:
/// - JSON formatting for log aggregation systems
/// - `RUST_LOG`-style level filtering via `EnvFilter`
/// - Output to stdout for container deployments
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use fusegate::logging::init_subscriber;
///
/// init_subscriber().expect("Failed to initialize logging");
/// tracing::info!("breaker online");
/// ```
pub fn init_subscriber() -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()?;
    Ok(())
}
