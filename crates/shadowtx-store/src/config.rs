use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::layout::DatabasePaths;
use crate::{Result, StoreError};

const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockSettings {
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub passwd: Option<PathBuf>,
    #[serde(default)]
    pub shadow: Option<PathBuf>,
    #[serde(default)]
    pub group: Option<PathBuf>,
    #[serde(default)]
    pub lock: Option<PathBuf>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

impl StoreConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(StoreError::system("read config", path, err)),
        };
        Self::from_toml_str(&raw).map_err(|message| StoreError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml_str(raw: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|err| err.to_string())?;
        if config.poll_interval_ms == Some(0) {
            return Err("poll_interval_ms must be greater than zero".to_string());
        }
        Ok(config)
    }

    pub fn paths(&self, root: Option<&Path>) -> DatabasePaths {
        let defaults = match root {
            Some(root) => DatabasePaths::under_root(root),
            None => DatabasePaths::system(),
        };
        DatabasePaths::new(
            self.passwd
                .clone()
                .unwrap_or_else(|| defaults.passwd().to_path_buf()),
            self.shadow
                .clone()
                .unwrap_or_else(|| defaults.shadow().to_path_buf()),
            self.group
                .clone()
                .unwrap_or_else(|| defaults.group().to_path_buf()),
            self.lock
                .clone()
                .unwrap_or_else(|| defaults.lock().to_path_buf()),
        )
    }

    pub fn lock_settings(&self) -> LockSettings {
        let defaults = LockSettings::default();
        LockSettings {
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            timeout: self.lock_timeout_ms.map(Duration::from_millis),
        }
    }
}
