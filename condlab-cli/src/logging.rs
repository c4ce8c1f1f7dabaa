//! Logging initialization.
//!
//! - `pretty`: human-readable, ANSI colors, target and file:line
//! - `json`: one structured object per event
//!
//! Events go to stderr so command output on stdout stays machine-readable.
//! `RUST_LOG` wins over the level derived from flags and config.

use condlab_runner::LogFormat;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for a `-v` count, falling back to the configured level.
pub fn level_for(verbose: u8, configured: Option<&str>) -> String {
    match verbose {
        0 => configured.unwrap_or("info").to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

pub fn init_logging(format: LogFormat, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
