use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "CHATDASH_LOG";

/// Install the global subscriber. The filter comes from `CHATDASH_LOG`,
/// then `RUST_LOG`, then `fallback` (the `[logging] filter` setting).
/// Calling this twice keeps the first subscriber.
pub fn init(fallback: &str) {
    let filter = resolve_filter(std::env::var(LOG_ENV).ok().as_deref(), fallback);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn resolve_filter(explicit: Option<&str>, fallback: &str) -> EnvFilter {
    explicit
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
