// common/src/utils.rs
use tracing_subscriber::EnvFilter;

/// Setup tracing for consistent logging across the gateway
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
