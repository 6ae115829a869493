//! Tracing subscriber setup.

use crate::config::LogConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber: an `fmt` layer writing to stderr, filtered by `RUST_LOG` and
/// falling back to the configured level.
///
/// Meant to be called once by binaries, libraries never install a subscriber.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry().with(env_filter(config)).with(fmt::layer().with_writer(std::io::stderr)).try_init()
}

fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_not_set| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_invalid| EnvFilter::new("info"))
}
