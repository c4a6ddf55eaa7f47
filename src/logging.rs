use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "bill_cleaner.log";
const DEFAULT_FILTER: &str = "bill_cleaner=info,warn";

/// Install the global subscriber: human-readable lines on the console and
/// JSON lines in a daily-rotated file under `log_dir`.
///
/// Keep the returned guard alive until exit so buffered file output is
/// flushed. Returns `None` if a subscriber was already installed.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    // The file layer is skipped if the directory cannot be created
    let (file_layer, guard) = match std::fs::create_dir_all(log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        Err(e) => {
            eprintln!("Could not create log directory {}: {}", log_dir.display(), e);
            (None, None)
        }
    };

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stdout);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .ok()?;

    guard
}
