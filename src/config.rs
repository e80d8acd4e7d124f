//! Configuration loading and management
//!
//! Handles parsing of `.taskrel.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::{Storage, DEFAULT_DATA_DIR};

/// Name of the configuration file at the workspace root
pub const CONFIG_FILE: &str = ".taskrel.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Default actor name when none specified
    #[serde(default = "default_actor")]
    pub default: String,
}

fn default_actor() -> String {
    "unknown".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: default_actor(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// State directory, relative to the workspace root
    #[serde(default = "default_data_dir")]
    pub dir: String,

    /// How long a transaction waits for the relations lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> crate::error::Result<()> {
        let dir = self.dir.trim();
        if dir.is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "storage.dir cannot be empty".to_string(),
            ));
        }
        if Path::new(dir).is_absolute() {
            return Err(crate::error::Error::InvalidConfig(format!(
                "storage.dir must be relative to the workspace root, got '{dir}'"
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.taskrel.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the workspace root, or return defaults when
    /// the file is missing. A present but invalid file is an error.
    pub fn load_from_root(root: &Path) -> crate::error::Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Storage rooted at `root` using the configured state directory.
    pub fn storage(&self, root: &Path) -> Storage {
        Storage::new(root.to_path_buf(), self.storage.dir.trim())
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.actor.default.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "actor.default cannot be empty".to_string(),
            ));
        }
        self.storage.validate()?;
        Ok(())
    }
}
