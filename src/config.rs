//! Configuration management for nlm
//!
//! This module handles loading, parsing, and defaulting configuration
//! from the YAML config file and environment variables.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// Environment variable overriding the config file path.
pub const CONFIG_PATH_ENV: &str = "NLM_CONFIG";

/// Main configuration structure for nlm
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authentication settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Download settings
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Profile used when `--profile` is not given
    #[serde(default = "default_profile")]
    pub default_profile: String,

    /// External helper command for headless re-authentication. When set,
    /// the recovery ladder's last layer runs this command and reads a
    /// session JSON from its stdout.
    #[serde(default)]
    pub login_command: Option<String>,
}

fn default_profile() -> String {
    "default".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_profile: default_profile(),
            login_command: None,
        }
    }
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloads default into when the output path is relative
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { output_dir: None }
    }
}

impl Config {
    /// Load configuration from an explicit path, the `NLM_CONFIG` env
    /// override, or the default config location. A missing file yields the
    /// defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let resolved = match path {
            Some(p) => Some(PathBuf::from(p)),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) => Some(PathBuf::from(p)),
                Err(_) => Self::default_path(),
            },
        };

        let Some(config_path) = resolved else {
            return Ok(Self::default());
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded config from {}", config_path.display());
        Ok(config)
    }

    /// Default config file location (`~/.config/nlm/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "nlm")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.auth.default_profile, "default");
        assert!(config.auth.login_command.is_none());
        assert!(config.download.output_dir.is_none());
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = Config::load(Some("/nonexistent/nlm-config.yaml")).unwrap();
        assert_eq!(config.auth.default_profile, "default");
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "auth:\n  default_profile: work\n  login_command: nlm-login --headless\n",
        )
        .unwrap();

        let config = Config::load(path.to_str()).unwrap();
        assert_eq!(config.auth.default_profile, "work");
        assert_eq!(
            config.auth.login_command.as_deref(),
            Some("nlm-login --headless")
        );
    }
}
