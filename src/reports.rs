use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::loader::Ledger;
use crate::models::{
    Amounts, CategoryTotal, DailyBreakdown, DailySummary, HistogramBin, PaymentMethodShare,
    Spread, Transaction,
};

// ---------------------------------------------------------------------------
// Daily summary
// ---------------------------------------------------------------------------

/// One row per distinct date with every monetary column summed.
///
/// Rows come out in grouping-key order, which is ascending by date. Callers
/// that need a different order sort the result themselves.
pub fn summarize_by_date(ledger: &Ledger) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<NaiveDate, Amounts> = BTreeMap::new();
    for txn in ledger.transactions() {
        *by_date.entry(txn.date).or_default() += txn.amounts;
    }
    by_date
        .into_iter()
        .map(|(date, amounts)| DailySummary { date, amounts })
        .collect()
}

/// Column-wise totals of a summary, for a grand-total row.
pub fn summary_totals(rows: &[DailySummary]) -> Amounts {
    let mut total = Amounts::default();
    for row in rows {
        total += row.amounts;
    }
    total
}

// ---------------------------------------------------------------------------
// Daily breakdown
// ---------------------------------------------------------------------------

/// Filter `txns` with `include`, then sum `field` per description.
fn totals_by_description<'a, I, P, F>(txns: I, include: P, field: F) -> Vec<CategoryTotal>
where
    I: IntoIterator<Item = &'a Transaction>,
    P: Fn(&Amounts) -> bool,
    F: Fn(&Amounts) -> f64,
{
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for txn in txns.into_iter().filter(|t| include(&t.amounts)) {
        *totals.entry(txn.description.as_str()).or_default() += field(&txn.amounts);
    }
    totals
        .into_iter()
        .map(|(description, amount)| CategoryTotal {
            description: description.to_string(),
            amount,
        })
        .collect()
}

/// Drill-down for one date: four per-description sub-ledgers plus the day's
/// rollups. The sub-ledgers only count qualifying rows; the rollups sum every
/// row of the day. A date without records gives empty tables and zero totals.
pub fn daily_breakdown(ledger: &Ledger, date: NaiveDate) -> DailyBreakdown {
    let day: Vec<&Transaction> = ledger.on(date).collect();

    let entries = totals_by_description(day.iter().copied(), |a| a.net_credit > 0.0, |a| a.net_credit);
    let exits = totals_by_description(day.iter().copied(), |a| a.net_debit > 0.0, |a| a.net_debit);
    let processor_fees = totals_by_description(
        day.iter().copied(),
        |a| a.processor_fee != 0.0,
        |a| a.processor_fee,
    );
    let shipping_fees = totals_by_description(
        day.iter().copied(),
        |a| a.shipping_fee != 0.0,
        |a| a.shipping_fee,
    );

    let gross_revenue: f64 = day.iter().map(|t| t.amounts.net_credit).sum();
    let processor_fee_total: f64 = day.iter().map(|t| t.amounts.processor_fee).sum();
    let shipping_fee_total: f64 = day.iter().map(|t| t.amounts.shipping_fee).sum();
    // Fees are stored negative, so they are added, not subtracted.
    let net_revenue = gross_revenue + processor_fee_total + shipping_fee_total;
    let total_fees = processor_fee_total + shipping_fee_total;

    debug!(%date, records = day.len(), "computed daily breakdown");

    DailyBreakdown {
        date,
        entries,
        exits,
        processor_fees,
        shipping_fees,
        transaction_count: day.len(),
        gross_revenue,
        net_revenue,
        total_fees,
        processor_fee_total,
        shipping_fee_total,
    }
}

// ---------------------------------------------------------------------------
// Whole-ledger distributions
// ---------------------------------------------------------------------------

/// Record count and percent share per payment method, most used first.
pub fn payment_methods(ledger: &Ledger) -> Vec<PaymentMethodShare> {
    let total = ledger.len();
    if total == 0 {
        return Vec::new();
    }
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for txn in ledger.transactions() {
        *counts.entry(txn.payment_method.as_str()).or_default() += 1;
    }
    let mut shares: Vec<PaymentMethodShare> = counts
        .into_iter()
        .map(|(method, count)| PaymentMethodShare {
            method: method.to_string(),
            count,
            share: count as f64 / total as f64 * 100.0,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.method.cmp(&b.method)));
    shares
}

/// Equal-width histogram of gross amounts between the smallest and largest
/// value. The last bin includes its upper edge.
pub fn gross_histogram(ledger: &Ledger, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<f64> = ledger.transactions().iter().map(|t| t.amounts.gross).collect();
    if bins == 0 || values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / bins as f64;
    // A zero or overflowing range cannot be split into bins.
    if width == 0.0 || !width.is_finite() {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Five-number summary of net credit amounts.
pub fn net_credit_spread(ledger: &Ledger) -> Option<Spread> {
    let mut values: Vec<f64> = ledger
        .transactions()
        .iter()
        .map(|t| t.amounts.net_credit)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    Some(Spread {
        min: values[0],
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values[values.len() - 1],
    })
}
