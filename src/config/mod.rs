//! Settings read from the JSON config file. Missing fields take their default value.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::directory_paths;
use crate::net::compression::{DEFAULT_LEVEL, DEFAULT_MAX_DECOMPRESSION_SIZE};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the block and item tables.
    pub data_path: PathBuf,
    /// How many chunk encoding jobs may run at once.
    pub worker_threads: usize,
    pub compression_level: u32,
    pub max_decompression_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(directory_paths::DATA),
            worker_threads: default_worker_threads(),
            compression_level: DEFAULT_LEVEL,
            max_decompression_size: DEFAULT_MAX_DECOMPRESSION_SIZE,
        }
    }
}

fn default_worker_threads() -> usize {
    // Leave a core for the caller.
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(2)
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        // Editors on Windows like to add a BOM.
        let contents = contents.trim_start_matches('\u{feff}');

        let settings: Settings = serde_json::from_str(contents).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.compression_level > 9 {
            return Err(ConfigError::Invalid {
                field: "compression_level",
                reason: format!("{} is not between 0 and 9", self.compression_level),
            });
        }
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
