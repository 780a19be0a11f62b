//! Tracing initialization for the host process.
//!
//! Logs go to a file under `~/.arbor/logs` rather than stderr; the host
//! is a windowed desktop process with no terminal attached.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,tower_http=warn,hyper=warn";

/// Keep the guard alive for the process lifetime; dropping it stops the
/// background log writer and loses buffered lines.
pub struct LoggingHandle {
    pub guard: WorkerGuard,
}

/// Install the global tracing subscriber. Call once, from the host shell.
///
/// Filter priority: `ARBOR_LOG_FILTER` > `RUST_LOG` > a default that
/// quiets the HTTP stack. `ARBOR_LOG_FORMAT=pretty` switches the file
/// layer from json lines to human-readable output.
pub fn init_logging() -> anyhow::Result<LoggingHandle> {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    let log_dir = std::path::PathBuf::from(home).join(".arbor").join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let filter = std::env::var("ARBOR_LOG_FILTER")
        .ok()
        .and_then(|value| EnvFilter::try_new(value).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let file_appender = tracing_appender::rolling::never(&log_dir, "core.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let format = std::env::var("ARBOR_LOG_FORMAT").unwrap_or_else(|_| "json".into());

    let registry = tracing_subscriber::registry().with(filter);
    if format.eq_ignore_ascii_case("pretty") {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .pretty()
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .json()
                    .flatten_event(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(log_dir = %log_dir.display(), "logging initialized");
    Ok(LoggingHandle { guard })
}
