//! Tracing setup.
//!
//! The terminal belongs to the TUI, so log lines go to a file instead of
//! stdout. `RUST_LOG` takes precedence over the configured filter.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::settings::LogSettings;

/// Install the global subscriber writing to `settings.file`.
///
/// Returns an error only if the log file cannot be opened. Installing twice
/// is harmless; the second call keeps the first subscriber.
pub fn init(settings: &LogSettings) -> io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.file)?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&settings.filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Filter for headless runs, writing to stderr.
pub fn init_stderr(settings: &LogSettings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&settings.filter))
        .with_writer(io::stderr)
        .try_init();
}

fn env_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
