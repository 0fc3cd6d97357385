//! Logging configuration for the hybrid chat assistant

use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::{
    self,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

use crate::Result;

const LOG_FILE_PREFIX: &str = "hybrid-chat.log";

/// Initialize logging with configuration
pub fn init_logging_with_config(config: Option<&crate::config::AppConfig>) -> Result<()> {
    match config {
        Some(config) => init_logging_with_level(&config.logging.level, &config.logging.dir),
        None => {
            let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
            init_logging_with_level(&level, "logs")
        }
    }
}

/// Initialize logging with a custom log level.
///
/// Console output goes to stderr so the interactive chat on stdout stays
/// readable; the file layer writes a daily-rolling log under `log_dir`.
pub fn init_logging_with_level(level: &str, log_dir: &str) -> Result<()> {
    let logs_dir = Path::new(log_dir);
    if !logs_dir.exists() {
        std::fs::create_dir_all(logs_dir)?;
    }

    let env_filter = EnvFilter::try_new(format!("warn,hybrid_chat={level}"))
        .unwrap_or_else(|_| EnvFilter::new("warn,hybrid_chat=info"));

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking)
        .with_ansi(false); // No colors in file

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| crate::HybridChatError::Custom(format!("Logging init failed: {e}")))?;

    tracing::debug!(
        "Logging initialized with level: {} (files under {}/{}.YYYY-MM-DD)",
        level,
        log_dir,
        LOG_FILE_PREFIX
    );

    // The guard flushes the file writer on drop; logging lives for the whole process
    std::mem::forget(guard);

    Ok(())
}

/// Initialize simple console logging for tests
pub fn init_simple_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .map_err(|e| crate::HybridChatError::Custom(format!("Logging init failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_logging_initialization() {
        // A second init in the same process fails; either way it must not panic
        let _ = init_simple_logging();
        let _ = init_simple_logging();
    }
}
