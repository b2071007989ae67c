use std::io;
use std::path::Path;

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "damon.log";

/// Install the global tracing subscriber.
///
/// The terminal belongs to the UI, so output goes to a daily rolling file in
/// `log_dir` or nowhere at all. Keep the returned guard alive until exit so
/// buffered lines get flushed.
pub fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // The global subscriber can be installed once per process, so both
    // outcomes are checked in one test.
    #[test]
    fn installs_file_subscriber_once() {
        let dir = std::env::temp_dir().join(format!("damon-logs-{}", Uuid::new_v4()));

        let guard = init_tracing(Some(&dir)).unwrap();

        assert!(guard.is_some());
        assert!(dir.is_dir());
        assert!(init_tracing(None).is_err());

        drop(guard);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
