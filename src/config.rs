use crate::app_dirs::AppDirs;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// overrides the default state-dir database location
    pub database_path: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Explicit path first, then config, then the platform state dir.
    pub fn resolve_db_path(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.database_path.clone())
            .or_else(AppDirs::db_path)
            .unwrap_or_else(|| PathBuf::from("typesight_sessions.db"))
    }

    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::UnknownLogLevel(self.log_level.clone()))
    }
}

pub trait ConfigStore {
    /// A missing file is the default config; an unreadable one is an error.
    fn load(&self) -> Result<Config, ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Result<Config, ConfigError> {
        let Ok(bytes) = fs::read(&self.path) else {
            return Ok(Config::default());
        };
        serde_json::from_slice::<Config>(&bytes).map_err(|source| ConfigError::Malformed {
            path: self.path.display().to_string(),
            source,
        })
    }
}
