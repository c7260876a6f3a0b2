//! Log output.
//!
//! Logs go to **stderr** so the grid printed on stdout stays parseable.
//! `RUST_LOG` takes precedence over `[logging].level`.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(&config.level),
    };

    let _ = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_target(config.with_target)
        .with_env_filter(env_filter)
        .try_init();
}
