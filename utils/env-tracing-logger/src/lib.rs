//! Set up a global `tracing` subscriber for command line tools.
//!
//! The filter comes from `RUST_LOG`. When it is unset, the directive given by
//! the caller is used instead, so tools can log at `info` by default without
//! modifying the process environment.

use time::{UtcOffset, format_description::well_known::Iso8601};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
};

/// Returned by the init functions. Hold it for the lifetime of `main`.
#[must_use]
pub struct LoggingGuard {
    _private: (),
}

/// Log to the console, filtered by `RUST_LOG`.
///
/// Panics if a global subscriber was already installed.
pub fn init() -> LoggingGuard {
    init_with_default("error")
}

/// Log to the console, filtered by `RUST_LOG` or `default_directive` when
/// `RUST_LOG` is unset.
///
/// Panics if a global subscriber was already installed.
pub fn init_with_default(default_directive: &str) -> LoggingGuard {
    initiate_logging::<&str>(None, false, default_directive).unwrap()
}

/// Start logging to file and console, both optional.
pub fn initiate_logging<P: AsRef<std::path::Path>>(
    path: Option<P>,
    disable_console: bool,
    default_directive: &str,
) -> Result<LoggingGuard, Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Fixed offset based on the local timezone at startup.
    let timer = OffsetTime::new(
        UtcOffset::from_whole_seconds(chrono::Local::now().offset().local_minus_utc())?,
        Iso8601::DEFAULT,
    );

    let file_layer = if let Some(path) = &path {
        let file = std::fs::File::create(path)?;
        let file_writer = std::sync::Mutex::new(file);
        Some(
            fmt::layer()
                .with_timer(timer.clone())
                .with_writer(file_writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true),
        )
    } else {
        None
    };

    let console_layer = if disable_console {
        None
    } else {
        Some(
            fmt::layer()
                .with_timer(timer)
                .with_writer(std::io::stderr)
                .with_ansi(!cfg!(windows))
                .with_target(false),
        )
    };

    let (filter, from_env) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, true),
        Err(_) => (EnvFilter::try_new(default_directive)?, false),
    };

    let collector = tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter);
    tracing::subscriber::set_global_default(collector)?;

    let source = if from_env {
        "RUST_LOG".to_string()
    } else {
        format!("default filter \"{default_directive}\"")
    };
    if let Some(path) = &path {
        tracing::debug!(
            "Logging initiated to file \"{}\" with {source}.",
            path.as_ref().display()
        );
    }
    if !disable_console {
        tracing::debug!("Logging initiated to console with {source}.");
    }

    Ok(LoggingGuard { _private: () })
}
