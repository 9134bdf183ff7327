//! Client configuration.
//!
//! Loaded from `~/.config/teleingest/config.toml`. A missing file is not an
//! error; all fields have defaults.
//!
//! ```toml
//! [mounts]
//! use-ftp = false
//!
//! [environment]
//! excluded = ["DATABASE_HOST", "DATABASE_PASSWORD"]
//!
//! [cluster]
//! manifest = "/path/to/cluster-manifest.toml"
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client configuration loaded from `~/.config/teleingest/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// Remote mount transport preferences.
    #[serde(default)]
    pub mounts: MountConfig,
    /// Environment propagation preferences.
    #[serde(default)]
    pub environment: EnvironmentConfig,
    /// Cluster access settings.
    #[serde(default)]
    pub cluster: ClusterConfig,
}

/// Remote mount transport preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct MountConfig {
    /// Mount remote volumes over FTP instead of SFTP.
    ///
    /// Incompatible with `--local-mount-port`, which requires SFTP.
    #[serde(default)]
    pub use_ftp: bool,
}

/// Environment propagation preferences.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentConfig {
    /// Environment keys never propagated from the remote container.
    #[serde(default)]
    pub excluded: Vec<String>,
}

/// Cluster access settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterConfig {
    /// Path to the workload manifest used by the static resolver.
    pub manifest: Option<PathBuf>,
}

impl ClientConfig {
    /// Load the configuration from the default config file.
    ///
    /// If the config file doesn't exist, returns the default configuration.
    pub fn load() -> Result<Self> {
        let config_path = match Self::config_path() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!(error = %e, "could not determine config path");
                return Ok(Self::default());
            }
        };

        if !config_path.exists() {
            tracing::debug!(
                path = %config_path.display(),
                "config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            Error::config(
                "load",
                format!("failed to read {}: {}", config_path.display(), e),
            )
        })?;

        let config: Self = toml::from_str(&contents).map_err(|e| {
            Error::config(
                "parse",
                format!("failed to parse {}: {}", config_path.display(), e),
            )
        })?;

        tracing::debug!(path = %config_path.display(), "loaded client configuration");
        Ok(config)
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::config("locate", "no config directory found"))?;
        Ok(config_dir.join("teleingest").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(!config.mounts.use_ftp);
        assert!(config.environment.excluded.is_empty());
        assert!(config.cluster.manifest.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[mounts]
use-ftp = true

[environment]
excluded = ["DATABASE_HOST", "DATABASE_PASSWORD"]

[cluster]
manifest = "/srv/cluster.toml"
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert!(config.mounts.use_ftp);
        assert_eq!(
            config.environment.excluded,
            vec!["DATABASE_HOST", "DATABASE_PASSWORD"]
        );
        assert_eq!(
            config.cluster.manifest.as_deref(),
            Some(std::path::Path::new("/srv/cluster.toml"))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: ClientConfig = toml::from_str("[mounts]\nuse-ftp = false\n").unwrap();
        assert!(config.environment.excluded.is_empty());
    }
}
