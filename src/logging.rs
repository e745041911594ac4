//! Logging - tracing subscriber for native hosts

use tracing_subscriber::{fmt, EnvFilter};

/// Set to `1` for JSON lines instead of the pretty format
pub const LOG_JSON_ENV: &str = "VHS_LOG_JSON";

/// Whether the environment asks for JSON output
pub fn json_requested() -> bool {
    std::env::var(LOG_JSON_ENV)
        .map(|value| value == "1")
        .unwrap_or(false)
}

/// Install the global subscriber. Filter comes from `RUST_LOG`, default `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_requested() {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_writer(std::io::stderr)
            .try_init();
    }
}
