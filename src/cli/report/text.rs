use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{money, number};
use crate::loader::Ledger;
use crate::models::{
    Amounts, CategoryTotal, DailyBreakdown, DailySummary, HistogramBin, PaymentMethodShare, Spread,
};
use crate::reports;

fn signed(val: f64, currency: &str) -> String {
    if val < 0.0 {
        money(val, currency).red().to_string()
    } else {
        money(val, currency).green().to_string()
    }
}

// ---------------------------------------------------------------------------
// Pure formatting functions (report data → String)
// ---------------------------------------------------------------------------

pub fn format_summary(rows: &[DailySummary], currency: &str) -> String {
    if rows.is_empty() {
        return "Daily Summary\nNo transactions found.".to_string();
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Gross", "Net Credit", "Net Debit", "Processor Fee", "Financing Fee",
        "Shipping Fee", "Taxes", "Coupon",
    ]);
    let mut push = |label: Cell, a: &Amounts| {
        table.add_row(vec![
            label,
            Cell::new(money(a.gross, currency)),
            Cell::new(money(a.net_credit, currency)),
            Cell::new(money(a.net_debit, currency)),
            Cell::new(money(a.processor_fee, currency)),
            Cell::new(money(a.financing_fee, currency)),
            Cell::new(money(a.shipping_fee, currency)),
            Cell::new(money(a.taxes, currency)),
            Cell::new(money(a.coupon, currency)),
        ]);
    };
    for row in rows {
        push(Cell::new(row.date.format("%Y-%m-%d")), &row.amounts);
    }
    push(Cell::new("Total".bold()), &reports::summary_totals(rows));

    format!("Daily Summary\n{table}")
}

fn format_category_table(title: &str, rows: &[CategoryTotal], currency: &str) -> String {
    if rows.is_empty() {
        return format!("{title}\n  (none)");
    }
    let mut table = Table::new();
    table.set_header(vec!["Description", "Amount"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.description),
            Cell::new(signed(r.amount, currency)),
        ]);
    }
    format!("{title}\n{table}")
}

pub fn format_breakdown(b: &DailyBreakdown, currency: &str) -> String {
    let mut out = vec![format!("Date: {}", b.date.format("%Y-%m-%d")).bold().to_string()];
    out.push(format!("  Transactions     {}", number(b.transaction_count)));
    out.push(format!("  Gross revenue    {}", money(b.gross_revenue, currency)));
    out.push(format!("  Net revenue      {}", money(b.net_revenue, currency)));
    out.push(format!("  Total fees       {}", money(b.total_fees, currency)));
    out.push(format!("  Processor fees   {}", money(b.processor_fee_total, currency)));
    out.push(format!("  Shipping fees    {}", money(b.shipping_fee_total, currency)));
    if b.is_empty() {
        out.push(String::new());
        out.push("No records for this date.".to_string());
    }
    out.push(String::new());
    out.push(format_category_table("Entries", &b.entries, currency));
    out.push(String::new());
    out.push(format_category_table("Exits", &b.exits, currency));
    out.push(String::new());
    out.push(format_category_table("Processor Fees", &b.processor_fees, currency));
    out.push(String::new());
    out.push(format_category_table("Shipping Fees", &b.shipping_fees, currency));
    out.join("\n")
}

pub fn format_dates(ledger: &Ledger) -> String {
    if ledger.is_empty() {
        return "No transactions found.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Date", "Records"]);
    for d in ledger.dates() {
        table.add_row(vec![
            Cell::new(d.format("%Y-%m-%d")),
            Cell::new(number(ledger.on(d).count())),
        ]);
    }
    format!("Dates\n{table}")
}

pub fn format_methods(shares: &[PaymentMethodShare]) -> String {
    if shares.is_empty() {
        return "Payment Methods\nNo transactions found.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Payment Method", "Records", "%"]);
    for s in shares {
        table.add_row(vec![
            Cell::new(&s.method),
            Cell::new(number(s.count)),
            Cell::new(format!("{:.1}%", s.share)),
        ]);
    }
    format!("Payment Methods\n{table}")
}

pub fn format_distribution(bins: &[HistogramBin], spread: Option<Spread>, currency: &str) -> String {
    let Some(spread) = spread else {
        return "Distribution\nNo transactions found.".to_string();
    };

    let peak = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let mut table = Table::new();
    table.set_header(vec!["Gross Amount", "Records", ""]);
    for b in bins {
        let bar_len = b.count * 40 / peak;
        table.add_row(vec![
            Cell::new(format!("{} to {}", money(b.lower, currency), money(b.upper, currency))),
            Cell::new(number(b.count)),
            Cell::new("█".repeat(bar_len)),
        ]);
    }

    let mut stats = Table::new();
    stats.set_header(vec!["Net Credit", "Amount"]);
    for (label, val) in [
        ("Min", spread.min),
        ("Q1", spread.q1),
        ("Median", spread.median),
        ("Q3", spread.q3),
        ("Max", spread.max),
    ] {
        stats.add_row(vec![Cell::new(label), Cell::new(money(val, currency))]);
    }

    format!("Gross Amount Distribution\n{table}\n\nNet Credit Spread\n{stats}")
}
