use crate::error::Result;
use crate::settings::{load_settings, settings_path};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let path = settings_path();

    println!(
        "Settings:   {}{}",
        path.display(),
        if path.exists() { "" } else { " (not created yet)" }
    );
    println!(
        "Ledger:     {}",
        settings.ledger_path.as_deref().unwrap_or("(not set)")
    );
    println!("Delimiter:  {:?}", settings.delimiter);
    println!("Currency:   {}", settings.currency);
    println!("Bins:       {}", settings.histogram_bins);
    Ok(())
}
