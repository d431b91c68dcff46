//! Application home directory and `config.yaml`.
//!
//! Everything lives under one home directory: the config file, the
//! project roster, the log file, and the history directory. The home
//! location comes from [`HOME_ENV`] or falls back to the platform
//! config dir; nothing below the entry point touches the environment
//! again.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides the home directory location.
pub const HOME_ENV: &str = "PUBSUB_META_HOME";

/// Log filter directives, `tracing_subscriber::EnvFilter` syntax.
pub const LOG_FILTER_ENV: &str = "PUBSUB_META_LOG";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Skin {
    #[default]
    Dark,
    HighContrast,
}

impl Skin {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::HighContrast => "high-contrast",
        }
    }
}

/// On-disk shape of `config.yaml`. Every field is optional so a bare
/// `{}` (or a missing file) yields the defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub skin: Skin,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("config file is not valid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Resolved configuration, built once at startup and passed down to
/// everything that needs it.
#[derive(Clone, Debug)]
pub struct Config {
    pub home: PathBuf,
    pub account: Option<String>,
    pub skin: Skin,
}

impl Config {
    /// Home directory for this process: the [`HOME_ENV`] override if
    /// set and non-empty, else `<platform config dir>/pubsub-meta`.
    pub fn resolve_home() -> PathBuf {
        match std::env::var(HOME_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pubsub-meta"),
        }
    }

    /// Loads `config.yaml` from `home`. A missing config file is fine
    /// and yields defaults; an unreadable or malformed one is not.
    pub fn load(home: PathBuf) -> Result<Self, ConfigError> {
        let path = home.join("config.yaml");
        let file = match fs::read_to_string(&path) {
            Ok(raw) => serde_yaml::from_str::<ConfigFile>(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => ConfigFile::default(),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        Ok(Self {
            home,
            account: file.account,
            skin: file.skin,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.yaml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.home.join("output.log")
    }

    pub fn projects_file(&self) -> PathBuf {
        self.home.join("projects")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.home.join("history")
    }

    /// Serialized defaults, written by `init` when no config exists.
    pub fn default_file_contents() -> String {
        serde_yaml::to_string(&ConfigFile::default()).unwrap_or_default()
    }
}

pub fn is_initialized(home: &Path) -> bool {
    home.is_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.account, None);
        assert_eq!(config.skin, Skin::Dark);
    }

    #[test]
    fn test_load_reads_account_and_skin() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "account: ops@example.com\nskin: high-contrast\n",
        )
        .unwrap();

        let config = Config::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.account.as_deref(), Some("ops@example.com"));
        assert_eq!(config.skin, Skin::HighContrast);
    }

    #[test]
    fn test_load_rejects_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yaml"), "skin: [not, a, skin]\n").unwrap();
        assert!(matches!(
            Config::load(dir.path().to_path_buf()),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_paths_hang_off_home() {
        let config = Config {
            home: PathBuf::from("/tmp/pm"),
            account: None,
            skin: Skin::Dark,
        };
        assert_eq!(config.config_file(), PathBuf::from("/tmp/pm/config.yaml"));
        assert_eq!(config.log_file(), PathBuf::from("/tmp/pm/output.log"));
        assert_eq!(config.projects_file(), PathBuf::from("/tmp/pm/projects"));
        assert_eq!(config.history_dir(), PathBuf::from("/tmp/pm/history"));
    }

    #[test]
    fn test_default_file_contents_round_trips() {
        let parsed: ConfigFile = serde_yaml::from_str(&Config::default_file_contents()).unwrap();
        assert_eq!(parsed.skin, Skin::Dark);
        assert!(parsed.account.is_none());
    }
}
