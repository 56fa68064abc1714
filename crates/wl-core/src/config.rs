//! Configuration management for workledger

use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage settings
    pub storage: StorageConfig,
    /// Defaults for new ledgers
    pub ledger: LedgerConfig,
    /// Output settings
    pub display: DisplayConfig,
}

impl Config {
    /// Load configuration from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
            .map_err(|e| e.with_context(format!("Failed to read {}", path.display())))
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LedgerError::Config(e.to_string()))
    }
}

/// Storage-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding ledger files; platform data dir when unset
    pub data_dir: Option<PathBuf>,
    /// File extension of ledger files
    pub extension: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            extension: "wlg".to_string(),
        }
    }
}

/// Defaults offered when creating a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Currency label for new ledgers
    pub default_currency: String,
    /// Hourly price suggested for new ledgers
    pub default_hourly_price: Option<f64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_currency: "EUR".to_string(),
            default_hourly_price: None,
        }
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Decimal places for printed hours and earnings
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { decimals: 2 }
    }
}
