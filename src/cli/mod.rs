pub mod config;
pub mod dashboard;
pub mod reformat;
pub mod report;
pub mod use_ledger;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::error::{DaybookError, Result};
use crate::loader::{self, parse_date, Ledger};
use crate::settings::{delimiter_byte, shellexpand_path, Settings};

#[derive(Parser)]
#[command(
    name = "daybook",
    version,
    about = "Daily drill-down reports for payment-processor transaction ledgers."
)]
pub struct Cli {
    /// Ledger file (default: the one set with `daybook use`)
    #[arg(long, global = true)]
    pub file: Option<String>,

    /// Field delimiter (default: from settings, normally ';')
    #[arg(long, global = true)]
    pub delimiter: Option<char>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-date totals of every amount column.
    Summary,
    /// Entries, exits and fees for one date.
    Day {
        /// Date to drill into, e.g. 2024-01-15
        date: String,
    },
    /// List the dates present in the ledger.
    Dates,
    /// Share of records per payment method.
    Methods,
    /// Gross amount histogram and net credit spread.
    Distribution {
        /// Number of histogram bins (default: from settings)
        #[arg(long)]
        bins: Option<usize>,
    },
    /// Rewrite the DATE column as YYYY-MM-DD into a new file.
    Reformat {
        /// Ledger file to normalize
        input: String,
        /// Output path (default: <name>_formatted.<ext> next to the input)
        #[arg(long)]
        output: Option<String>,
    },
    /// Remember a ledger file as the default for other commands.
    Use {
        /// Path to the ledger file
        path: String,
    },
    /// Show the effective settings.
    Config,
    /// Interactive dashboard (the default).
    Dashboard,
}

/// Where to read the ledger from, after merging flags with settings.
pub struct LedgerSource {
    pub path: PathBuf,
    pub delimiter: u8,
}

impl LedgerSource {
    pub fn resolve(file: Option<&str>, delimiter: Option<char>, settings: &Settings) -> Result<Self> {
        let path = file
            .map(str::to_string)
            .or_else(|| settings.ledger_path.clone())
            .ok_or(DaybookError::NoLedger)?;
        let delimiter = delimiter_byte(delimiter.unwrap_or(settings.delimiter))?;
        Ok(Self {
            path: PathBuf::from(shellexpand_path(&path)),
            delimiter,
        })
    }

    pub fn load(&self) -> Result<Ledger> {
        Ok(loader::load(&self.path, self.delimiter)?)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

pub(crate) fn parse_date_arg(raw: &str) -> Result<NaiveDate> {
    parse_date(raw).ok_or_else(|| DaybookError::InvalidDate(raw.to_string()))
}
