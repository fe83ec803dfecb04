use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{DaybookError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Ledger used when `--file` is not given.
    #[serde(default)]
    pub ledger_path: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
}

fn default_delimiter() -> char {
    ';'
}

fn default_currency() -> String {
    "R$".to_string()
}

fn default_histogram_bins() -> usize {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ledger_path: None,
            delimiter: default_delimiter(),
            currency: default_currency(),
            histogram_bins: default_histogram_bins(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("daybook")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let content = std::fs::read_to_string(&path).unwrap_or_default();
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

/// Validate a delimiter for the CSV reader, which works on single bytes.
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    if delimiter.is_ascii() && delimiter != '"' && delimiter != '\n' && delimiter != '\r' {
        Ok(delimiter as u8)
    } else {
        Err(DaybookError::InvalidDelimiter(delimiter.to_string()))
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
