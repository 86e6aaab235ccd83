use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging on stderr, plus daily-rotated JSON files when `log_dir` is set.
///
/// Stdout is left to the scan results. The returned guard must be kept alive
/// until exit so buffered file logs are flushed.
pub fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flyscanner=info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            // Ensure logs directory exists
            let _ = fs::create_dir_all(dir);

            let file_appender = tracing_appender::rolling::daily(dir, "flyscanner.log");
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().json().with_writer(non_blocking_writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A subscriber may already be installed (tests, embedding callers)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_dir_gets_file_layer_and_guard() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(Some(&log_dir));
        tracing::info!("file layer ready");

        assert!(guard.is_some());
        assert!(log_dir.is_dir());

        // second install is a no-op rather than a panic
        assert!(init_logging(None).is_none());
    }
}
