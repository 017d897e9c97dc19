use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::policy::DEFAULT_PREFIXES;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// If the path is absolute, it is returned as-is.
/// If the path is relative, it is joined with the config file's parent
/// directory, so behavior does not depend on the current working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default snapshots directory (relative to config file).
pub const DEFAULT_SNAPSHOTS_DIR: &str = "snapshots";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    512
}

fn default_expiry_seconds() -> u64 {
    1800
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_allowed_prefixes() -> Vec<String> {
    DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect()
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// StorageConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Snapshot blob directory. Relative paths are resolved against the
    /// config file directory; defaults to `snapshots` next to it.
    #[serde(default)]
    pub snapshots_dir: Option<PathBuf>,
}

// ============================================================================
// RetentionConfig
// ============================================================================

/// Report TTL settings. Snapshots are never expired.
#[derive(Debug, Deserialize)]
pub struct RetentionConfig {
    /// Age past which a stored report is evicted. Zero disables the reaper.
    #[serde(default = "default_expiry_seconds")]
    pub expiry_seconds: u64,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            expiry_seconds: default_expiry_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

// ============================================================================
// IngestConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct IngestConfig {
    /// Task identifier prefixes accepted for reports and snapshots.
    #[serde(default = "default_allowed_prefixes")]
    pub allowed_prefixes: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: default_allowed_prefixes(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.server.max_connections, 512);
        assert_eq!(config.retention.expiry_seconds, 1800);
        assert_eq!(config.retention.sweep_interval_seconds, 60);
        assert!(config.storage.snapshots_dir.is_none());
        assert_eq!(config.ingest.allowed_prefixes.len(), 5);
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(missing_path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 60
storage:
  snapshots_dir: "/var/lib/reportd/snapshots"
retention:
  expiry_seconds: 600
  sweep_interval_seconds: 10
ingest:
  allowed_prefixes: ["scan-", "audit-"]
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(
            config.storage.snapshots_dir,
            Some(PathBuf::from("/var/lib/reportd/snapshots"))
        );
        assert_eq!(config.retention.expiry_seconds, 600);
        assert_eq!(config.retention.sweep_interval_seconds, 10);
        assert_eq!(config.ingest.allowed_prefixes, vec!["scan-", "audit-"]);
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0"); // default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.retention.expiry_seconds, 1800); // default
        assert_eq!(config.ingest.allowed_prefixes.len(), 5); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path().to_str().unwrap()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_path_absolute() {
        let config_path = Path::new("/etc/reportd/reportd.yaml");
        let absolute_path = Path::new("/var/data/snapshots");
        let result = resolve_path(config_path, absolute_path);
        assert_eq!(result, PathBuf::from("/var/data/snapshots"));
    }

    #[test]
    fn test_resolve_path_relative() {
        let config_path = Path::new("/etc/reportd/reportd.yaml");
        let relative_path = Path::new("snapshots");
        let result = resolve_path(config_path, relative_path);
        assert_eq!(result, PathBuf::from("/etc/reportd/snapshots"));
    }

    #[test]
    fn test_resolve_path_config_in_current_dir() {
        let config_path = Path::new("reportd.yaml");
        let relative_path = Path::new("snapshots");
        let result = resolve_path(config_path, relative_path);
        assert_eq!(result, PathBuf::from("snapshots"));
    }
}
