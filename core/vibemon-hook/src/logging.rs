//! Tracing setup for the hook binary.
//!
//! Logs go to stderr; stdout is reserved for command replies and the
//! statusline. `VIBEMON_DEBUG` forces the debug level, otherwise `RUST_LOG`
//! applies with a quiet default.

use std::env;

use tracing_subscriber::EnvFilter;

pub fn init() {
    let debug_enabled = env::var("VIBEMON_DEBUG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    let filter = if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
