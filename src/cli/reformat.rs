use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::loader::reformat;
use crate::settings::delimiter_byte;

/// `ledger.csv` → `ledger_formatted.csv`, next to the input.
pub(crate) fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "ledger".to_string());
    let name = match input.extension() {
        Some(ext) => format!("{stem}_formatted.{}", ext.to_string_lossy()),
        None => format!("{stem}_formatted"),
    };
    input.with_file_name(name)
}

pub fn run(input: &str, output: Option<&str>, delimiter: char) -> Result<()> {
    let input = PathBuf::from(input);
    let output = output.map(PathBuf::from).unwrap_or_else(|| default_output(&input));
    let rows = reformat(&input, &output, delimiter_byte(delimiter)?)?;
    println!("{rows} rows written to {}", output.display());
    Ok(())
}
