//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and `tower_http`. With a log directory, lines also go to a daily
//! rolling file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

fn default_filter(level: &str) -> String {
    format!("booking_server={level},tower_http={level},sqlx=warn")
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// stops the file writer.
pub fn init_logger(level: &str, json: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    let (file_writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "booking-server.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // try_init: a second call (tests) keeps the first subscriber
    let result = match (json, file_writer) {
        (true, Some(file)) => builder.json().with_writer(std::io::stdout.and(file)).try_init(),
        (true, None) => builder.json().try_init(),
        (false, Some(file)) => builder.with_writer(std::io::stdout.and(file)).try_init(),
        (false, None) => builder.try_init(),
    };
    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }

    guard
}
