//! Configuration for fen4term.
//!
//! Loaded from `~/.fen4term/config.toml`; every field is optional:
//!
//! ```toml
//! # Engine executable and its arguments
//! engine = "./build/src/athena"
//! args = []
//!
//! # Pump cadence in milliseconds
//! poll_interval_ms = 50
//!
//! # Depth used by the :go shortcut
//! go_depth = 10
//!
//! # Echo sent commands into the engine log as ">>> cmd"
//! log_commands = true
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::session::EngineConfig;

/// Main configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine executable
    pub engine: PathBuf,
    /// Engine arguments
    pub args: Vec<String>,
    /// Pump cadence
    pub poll_interval_ms: u64,
    /// Depth for the `:go` shortcut
    pub go_depth: u32,
    /// Echo sent commands into the log
    pub log_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: PathBuf::from("./build/src/athena"),
            args: Vec::new(),
            poll_interval_ms: 50,
            go_depth: 10,
            log_commands: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults.
    pub fn load() -> Self {
        if let Some(path) = Self::get_config_path() {
            if path.exists() {
                match fs::read_to_string(&path) {
                    Ok(content) => match Self::from_toml_str(&content) {
                        Ok(config) => return config,
                        Err(e) => tracing::warn!("ignoring {}: {}", path.display(), e),
                    },
                    Err(e) => tracing::warn!("cannot read {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), String> {
        let path = Self::get_config_path().ok_or("Could not determine config path")?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Directory holding config and log files
    pub fn config_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".fen4term"))
    }

    fn get_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Pump cadence, never below 1ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Launch settings for the engine session
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            program: self.engine.clone(),
            args: self.args.clone(),
            echo_commands: self.log_commands,
        }
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
