//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::config::LoggingConfig;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
///
/// Safe to call more than once: if a subscriber is already installed (tests,
/// host application) the call is a no-op and returns `false`.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.file.as_ref() {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .is_ok(),
            Err(e) => {
                eprintln!("Could not open log file {}: {}; logging to stderr", path.display(), e);
                registry
                    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                    .try_init()
                    .is_ok()
            }
        },
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(level = %config.level, "Tracing initialized");
    }

    installed
}
