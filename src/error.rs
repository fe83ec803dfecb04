use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or rewriting a ledger file. All of them are fatal:
/// a ledger is either loaded completely or not at all.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Header is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Line {line}: cannot parse date {value:?}")]
    InvalidDate { line: u64, value: String },
}

#[derive(Error, Debug)]
pub enum DaybookError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("No ledger file given. Pass --file or run `daybook use <PATH>`.")]
    NoLedger,

    #[error("Cannot parse date: {0}")]
    InvalidDate(String),

    #[error("Invalid delimiter {0:?}: expected a single ASCII character")]
    InvalidDelimiter(String),
}

pub type Result<T> = std::result::Result<T, DaybookError>;
