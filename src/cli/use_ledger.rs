use std::path::PathBuf;

use crate::error::{DaybookError, Result};
use crate::loader;
use crate::settings::{delimiter_byte, load_settings, save_settings, shellexpand_path};

pub fn run(path: &str, delimiter: Option<char>) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));
    if !resolved.is_file() {
        return Err(DaybookError::Settings(format!(
            "No ledger file found at {}",
            resolved.display()
        )));
    }

    let mut settings = load_settings();
    if let Some(d) = delimiter {
        settings.delimiter = d;
    }
    // The ledger must load cleanly before it becomes the default.
    let ledger = loader::load(&resolved, delimiter_byte(settings.delimiter)?)?;

    settings.ledger_path = Some(resolved.to_string_lossy().to_string());
    save_settings(&settings)?;

    println!(
        "Using {} ({} records, {} dates)",
        resolved.display(),
        ledger.len(),
        ledger.dates().len()
    );
    Ok(())
}
