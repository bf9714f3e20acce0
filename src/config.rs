use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::WritePolicy;

/// Environment variable overriding `api.url`
pub const API_URL_ENV: &str = "STOCKROOM_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub notifications: NotificationsConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL of the inventory backend
  pub url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: "http://localhost:3000".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// Seconds a successful fetch is served before it is refetched
  pub stale_time_secs: u64,
  pub products: WritePolicy,
  pub orders: WritePolicy,
  pub companies: WritePolicy,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 60,
      products: WritePolicy::optimistic(),
      orders: WritePolicy::invalidate(),
      companies: WritePolicy::invalidate(),
    }
  }
}

impl CacheConfig {
  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
  /// How long a notification stays visible
  pub timeout_ms: u64,
}

impl Default for NotificationsConfig {
  fn default() -> Self {
    Self { timeout_ms: 5000 }
  }
}

impl NotificationsConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_millis(self.timeout_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Filter directive used when STOCKROOM_LOG is unset
  pub level: String,
  /// Log directory (default: $XDG_DATA_HOME/stockroom/logs)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./stockroom.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/stockroom/config.yaml
  ///
  /// Every setting has a default, so finding no file is not an error.
  /// `STOCKROOM_API_URL` overrides `api.url` either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    Ok(config.with_api_url(std::env::var(API_URL_ENV).ok()))
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("stockroom.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("stockroom").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Replace the API base URL when an override is given.
  pub fn with_api_url(self, url: Option<String>) -> Self {
    match url.filter(|u| !u.trim().is_empty()) {
      Some(url) => Config {
        api: ApiConfig { url },
        ..self
      },
      None => self,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::WriteEffect;
  use std::io::Write;

  fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
  }

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.url, "http://localhost:3000");
    assert_eq!(config.notifications.timeout(), Duration::from_millis(5000));
    assert_eq!(config.cache.products, WritePolicy::optimistic());
    assert_eq!(config.cache.orders, WritePolicy::invalidate());
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let file = write_config("api:\n  url: https://inventory.example.com\n");
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.api.url, "https://inventory.example.com");
    assert_eq!(config.cache.stale_time_secs, 60);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_policy_override() {
    let file = write_config(
      "cache:\n  stale_time_secs: 0\n  orders:\n    on_create: splice_to_front\n    on_update: replace_in_place\n    on_delete: invalidate\n",
    );
    let config = Config::load_from_path(file.path()).unwrap();

    assert_eq!(config.cache.stale_time(), Duration::ZERO);
    assert_eq!(config.cache.orders.on_create, WriteEffect::SpliceToFront);
    assert_eq!(config.cache.products, WritePolicy::optimistic());
  }

  #[test]
  fn test_invalid_yaml_is_an_error() {
    let file = write_config("cache: [not, a, map]\n");
    let err = Config::load_from_path(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    let err = Config::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }

  #[test]
  fn test_api_url_override() {
    let config = Config::default().with_api_url(Some("http://10.0.0.2:8080".into()));
    assert_eq!(config.api.url, "http://10.0.0.2:8080");

    let config = config.with_api_url(Some("  ".into()));
    assert_eq!(config.api.url, "http://10.0.0.2:8080");

    let config = config.with_api_url(None);
    assert_eq!(config.api.url, "http://10.0.0.2:8080");
  }
}
