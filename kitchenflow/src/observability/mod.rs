//! Tracing bootstrap.

/// Initializes a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise the given fallback
/// level. Calling this twice is harmless; the second init is ignored.
pub fn init_tracing(fallback_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
