//! Configuration for notevault

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the note files
    #[serde(rename = "vault-path")]
    pub vault_path: PathBuf,

    /// Depth of the store's command queue
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,

    /// Buffer size of the change event broadcast
    #[serde(rename = "event-capacity")]
    pub event_capacity: usize,
}

fn default_vault_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notevault")
        .join("vault")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            channel_capacity: crate::DEFAULT_CHANNEL_CAPACITY,
            event_capacity: crate::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Config with defaults but an explicit vault path
    pub fn with_vault(vault_path: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: vault_path.into(),
            ..Self::default()
        }
    }

    /// Conventional per-user config file, `{config_dir}/notevault/notevault.yml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notevault").join("notevault.yml"))
    }

    /// Read a YAML config file; a file that does not exist yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e).context(format!("Failed to read config {}", path.display())),
        };
        let config = serde_yaml::from_str(&content).context(format!("Failed to parse config {}", path.display()))?;
        tracing::info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}
