pub mod text;

use crate::cli::{parse_date_arg, LedgerSource};
use crate::error::Result;
use crate::reports;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Data-fetching + printing wrappers (used by dispatch in main)
// ---------------------------------------------------------------------------

pub fn summary(source: &LedgerSource, settings: &Settings) -> Result<()> {
    let ledger = source.load()?;
    let rows = reports::summarize_by_date(&ledger);
    println!("{}", text::format_summary(&rows, &settings.currency));
    Ok(())
}

pub fn day(source: &LedgerSource, settings: &Settings, date: &str) -> Result<()> {
    let date = parse_date_arg(date)?;
    let ledger = source.load()?;
    let breakdown = reports::daily_breakdown(&ledger, date);
    println!("{}", text::format_breakdown(&breakdown, &settings.currency));
    Ok(())
}

pub fn dates(source: &LedgerSource) -> Result<()> {
    let ledger = source.load()?;
    println!("{}", text::format_dates(&ledger));
    Ok(())
}

pub fn methods(source: &LedgerSource) -> Result<()> {
    let ledger = source.load()?;
    println!("{}", text::format_methods(&reports::payment_methods(&ledger)));
    Ok(())
}

pub fn distribution(source: &LedgerSource, settings: &Settings, bins: Option<usize>) -> Result<()> {
    let ledger = source.load()?;
    let bins = reports::gross_histogram(&ledger, bins.unwrap_or(settings.histogram_bins));
    let spread = reports::net_credit_spread(&ledger);
    println!("{}", text::format_distribution(&bins, spread, &settings.currency));
    Ok(())
}
