use crate::config::LogConfig;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive, e.g. `stockroom=debug`
pub const LOG_ENV: &str = "STOCKROOM_LOG";

/// Where log files go when `log.dir` is unset
pub fn default_dir() -> Option<PathBuf> {
  dirs::data_dir().map(|d| d.join("stockroom").join("logs"))
}

/// Install a daily rolling file subscriber. Stdout belongs to the shell,
/// so nothing is logged there. Keep the guard alive until exit or buffered
/// lines are lost.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let dir = config
    .dir
    .clone()
    .or_else(default_dir)
    .ok_or_else(|| eyre!("Could not determine a log directory; set log.dir"))?;
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "stockroom.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_new(&config.level))
    .map_err(|e| eyre!("Invalid log filter: {}", e))?;

  let file_layer = tracing_subscriber::fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_target(true);

  tracing_subscriber::registry()
    .with(filter)
    .with(file_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to install logger: {}", e))?;

  tracing::info!(path = %dir.display(), "logging initialized");
  Ok(guard)
}
