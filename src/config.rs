use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// User settings, read from `~/.boltwatch/config.json` or an explicit path.
/// Every field is optional in the file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Label that marks fabric hardware ports and interface names.
    pub fabric_label: String,
    /// Bridge interface whose members are fabric interfaces.
    pub bridge_interface: String,
    /// Token that opens a member line in the bridge description.
    pub member_marker: String,
    /// Interface name prefixes that always count as fabric interfaces.
    pub interface_prefixes: Vec<String>,
    pub interval_secs: u64,
    /// Where sysfs is mounted (Linux only).
    pub sysfs_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fabric_label: "Thunderbolt".to_string(),
            bridge_interface: "bridge0".to_string(),
            member_marker: "member:".to_string(),
            interface_prefixes: vec!["tb".to_string()],
            interval_secs: 3,
            sysfs_root: PathBuf::from("/sys"),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".boltwatch").join("config.json"))
    }

    /// Load from `path` when given; otherwise from the default location,
    /// falling back to defaults when that file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(Error::config("interval_secs must be at least 1"));
        }
        if self.bridge_interface.trim().is_empty() {
            return Err(Error::config("bridge_interface must not be empty"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}
