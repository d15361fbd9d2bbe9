// src/config/loader.rs
//! Configuration loading from TOML files
//!
//! Missing fields fall back to their serde defaults, so a deployment file only
//! states what it overrides.

use crate::config::EngineConfig;
use std::path::{Path, PathBuf};

/// Configuration loader with an optional search-path list
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// No configuration file found at any search path
    FileNotFound(String),
    /// TOML syntax or type error
    ParseError(String),
    /// Parsed cleanly but failed [`EngineConfig::validate`]
    ValidationError(String),
    /// Underlying filesystem error
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path)
            }
            ConfigError::ParseError(msg) => write!(f, "Configuration parse error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
            ConfigError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create a loader with no search paths; only explicit paths will load.
    pub fn new() -> Self {
        Self {
            search_paths: Vec::new(),
        }
    }

    /// Create a loader that tries the given paths in order.
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths: paths,
        }
    }

    /// Load and validate a configuration from an explicit path.
    pub fn load_from_path(path: &Path) -> Result<EngineConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&raw)?;
        config
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }

    /// Load from the first search path that exists, or fall back to defaults
    /// when no file is present at all.
    pub fn load(&self) -> Result<EngineConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                return Self::load_from_path(path);
            }
        }
        Ok(EngineConfig::default())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
