use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::models::{Amounts, Transaction};

pub const DATE_COLUMN: &str = "DATE";

pub const REQUIRED_COLUMNS: [&str; 11] = [
    "DATE",
    "DESCRIPTION",
    "GROSS_AMOUNT",
    "NET_CREDIT_AMOUNT",
    "NET_DEBIT_AMOUNT",
    "MP_FEE_AMOUNT",
    "FINANCING_FEE_AMOUNT",
    "SHIPPING_FEE_AMOUNT",
    "TAXES_AMOUNT",
    "COUPON_AMOUNT",
    "PAYMENT_METHOD",
];

// ---------------------------------------------------------------------------
// Field parsing
// ---------------------------------------------------------------------------

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

// Month-first wins for ambiguous slash dates; day-first only matches once the
// first field is above 12.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
];

/// Parse a date cell into a calendar date. Time of day and zone offset are
/// dropped; a datetime with an offset keeps the date as written in that offset.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a monetary cell. Empty cells are zero; `None` means the cell holds
/// something that is not a number.
///
/// `,` is only accepted as a thousands separator (`1,234.56`). A decimal
/// comma such as `10,50` is not a number here.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_matches('"').replace("R$", "");
    let s = s.replace(['$', ' '], "");
    if s.is_empty() {
        return Some(0.0);
    }
    let (negate, body) = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, s.as_str()),
    };
    let value = strip_thousands(body)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())?;
    Some(if negate { -value } else { value })
}

/// Remove `,` separators from a well-formed integer part (`1,234,567.89`).
fn strip_thousands(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let digits = s.trim_start_matches(['-', '+']);
    let sign = &s[..s.len() - digits.len()];
    let (int_part, frac) = match digits.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (digits, None),
    };

    let all_digits = |g: &str| g.bytes().all(|b| b.is_ascii_digit());
    let mut groups = int_part.split(',');
    let head = groups.next()?;
    if !(1..=3).contains(&head.len()) || !all_digits(head) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && all_digits(g)) {
        return None;
    }

    let mut out = format!("{sign}{}", int_part.replace(',', ""));
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    Some(out)
}

fn lenient_amount(raw: &str, line: u64, column: &str) -> f64 {
    parse_amount(raw).unwrap_or_else(|| {
        warn!(line, column, value = raw, "non-numeric amount treated as zero");
        0.0
    })
}

fn missing_columns(headers: &csv::StringRecord, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "DATE")]
    date: String,
    #[serde(rename = "DESCRIPTION")]
    description: String,
    #[serde(rename = "GROSS_AMOUNT")]
    gross: String,
    #[serde(rename = "NET_CREDIT_AMOUNT")]
    net_credit: String,
    #[serde(rename = "NET_DEBIT_AMOUNT")]
    net_debit: String,
    #[serde(rename = "MP_FEE_AMOUNT")]
    processor_fee: String,
    #[serde(rename = "FINANCING_FEE_AMOUNT")]
    financing_fee: String,
    #[serde(rename = "SHIPPING_FEE_AMOUNT")]
    shipping_fee: String,
    #[serde(rename = "TAXES_AMOUNT")]
    taxes: String,
    #[serde(rename = "COUPON_AMOUNT")]
    coupon: String,
    #[serde(rename = "PAYMENT_METHOD")]
    payment_method: String,
}

impl RawRow {
    fn into_transaction(self, line: u64) -> Result<Transaction, LoadError> {
        let date = parse_date(&self.date).ok_or_else(|| LoadError::InvalidDate {
            line,
            value: self.date.clone(),
        })?;
        let amounts = Amounts {
            gross: lenient_amount(&self.gross, line, "GROSS_AMOUNT"),
            net_credit: lenient_amount(&self.net_credit, line, "NET_CREDIT_AMOUNT"),
            net_debit: lenient_amount(&self.net_debit, line, "NET_DEBIT_AMOUNT"),
            processor_fee: lenient_amount(&self.processor_fee, line, "MP_FEE_AMOUNT"),
            financing_fee: lenient_amount(&self.financing_fee, line, "FINANCING_FEE_AMOUNT"),
            shipping_fee: lenient_amount(&self.shipping_fee, line, "SHIPPING_FEE_AMOUNT"),
            taxes: lenient_amount(&self.taxes, line, "TAXES_AMOUNT"),
            coupon: lenient_amount(&self.coupon, line, "COUPON_AMOUNT"),
        };
        Ok(Transaction {
            date,
            description: self.description,
            amounts,
            payment_method: self.payment_method,
        })
    }
}

/// An immutable snapshot of every transaction in a ledger file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    pub fn load(path: &Path, delimiter: u8) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ledger = Self::from_reader(std::io::BufReader::new(file), delimiter)?;
        info!(
            path = %path.display(),
            records = ledger.len(),
            dates = ledger.dates().len(),
            "ledger loaded"
        );
        Ok(ledger)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, LoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let missing = missing_columns(&headers, &REQUIRED_COLUMNS);
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let mut transactions = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let raw: RawRow = record.deserialize(Some(&headers))?;
            transactions.push(raw.into_transaction(line)?);
        }
        debug!(records = transactions.len(), "parsed ledger rows");
        Ok(Self { transactions })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Distinct dates, ascending. This is the set a caller may select from.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.transactions
            .iter()
            .map(|t| t.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn on(&self, date: NaiveDate) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| t.date == date)
    }
}

/// Load a ledger file; the whole file or nothing.
pub fn load(path: &Path, delimiter: u8) -> Result<Ledger, LoadError> {
    Ledger::load(path, delimiter)
}

// ---------------------------------------------------------------------------
// reformat
// ---------------------------------------------------------------------------

/// Rewrite the `DATE` column of `input` as `YYYY-MM-DD` and save the result to
/// `output`. Every other cell and the header pass through unchanged. Running
/// it on its own output reproduces that output byte for byte.
///
/// Returns the number of data rows written.
pub fn reformat(input: &Path, output: &Path, delimiter: u8) -> Result<usize, LoadError> {
    let file = std::fs::File::open(input).map_err(|source| LoadError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(std::io::BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h.trim() == DATE_COLUMN)
        .ok_or_else(|| LoadError::MissingColumns(vec![DATE_COLUMN.to_string()]))?;

    // Buffer in memory so a bad date never leaves a half-written file behind.
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    wtr.write_record(&headers)?;

    let mut rows = 0usize;
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let raw = record.get(date_idx).unwrap_or("");
        let date = parse_date(raw).ok_or_else(|| LoadError::InvalidDate {
            line,
            value: raw.to_string(),
        })?;
        let formatted = date.format("%Y-%m-%d").to_string();
        let fields: Vec<&str> = record
            .iter()
            .enumerate()
            .map(|(i, field)| if i == date_idx { formatted.as_str() } else { field })
            .collect();
        wtr.write_record(&fields)?;
        rows += 1;
    }

    let bytes = wtr.into_inner().map_err(|e| LoadError::Write {
        path: output.to_path_buf(),
        source: e.into_error(),
    })?;
    std::fs::write(output, bytes).map_err(|source| LoadError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    info!(input = %input.display(), output = %output.display(), rows, "ledger reformatted");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    const HEADER: &str = "DATE;DESCRIPTION;GROSS_AMOUNT;NET_CREDIT_AMOUNT;NET_DEBIT_AMOUNT;MP_FEE_AMOUNT;FINANCING_FEE_AMOUNT;SHIPPING_FEE_AMOUNT;TAXES_AMOUNT;COUPON_AMOUNT;PAYMENT_METHOD";

    fn ledger_from(rows: &[&str]) -> Result<Ledger, LoadError> {
        let mut content = format!("{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        Ledger::from_reader(content.as_bytes(), b';')
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date_plain_formats() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024/01/15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15.01.2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("  2024-01-15 "), Some(date(2024, 1, 15)));
    }

    #[test]
    fn test_parse_date_ambiguous_slash_is_month_first() {
        assert_eq!(parse_date("02/03/2024"), Some(date(2024, 2, 3)));
    }

    #[test]
    fn test_parse_date_drops_time_of_day() {
        assert_eq!(parse_date("2024-01-01T15:30:00"), Some(date(2024, 1, 1)));
        assert_eq!(parse_date("2024-01-01T15:30"), Some(date(2024, 1, 1)));
        assert_eq!(parse_date("2024-01-01 23:59:59.123"), Some(date(2024, 1, 1)));
        assert_eq!(parse_date("2024-01-01T15:30:00.000-04:00"), Some(date(2024, 1, 1)));
        assert_eq!(parse_date("2024-01-01T23:30:00Z"), Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("13/13/2024"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("  -42.50 "), Some(-42.5));
        assert_eq!(parse_amount("R$ 10.00"), Some(10.0));
        assert_eq!(parse_amount("-$50.00"), Some(-50.0));
        assert_eq!(parse_amount("(5.00)"), Some(-5.0));
        assert_eq!(parse_amount(""), Some(0.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_parse_amount_thousands_separators() {
        assert_eq!(parse_amount("1,234,567.89"), Some(1234567.89));
        assert_eq!(parse_amount("-1,234"), Some(-1234.0));
        assert_eq!(parse_amount("(1,000.50)"), Some(-1000.5));
        assert_eq!(parse_amount("R$ 12,345"), Some(12345.0));
    }

    #[test]
    fn test_parse_amount_decimal_comma_is_not_a_number() {
        assert_eq!(parse_amount("10,50"), None);
        assert_eq!(parse_amount("-0,99"), None);
        assert_eq!(parse_amount("1.234,56"), None);
        assert_eq!(parse_amount("1234,567"), None);
        assert_eq!(parse_amount("1,23,456"), None);
        assert_eq!(parse_amount(",5"), None);
    }

    #[test]
    fn test_load_decimal_comma_falls_back_to_zero() {
        let ledger = ledger_from(&["2024-01-01;Sale;10,50;10,50;0;-0,99;0;0;0;0;pix"]).unwrap();
        let amounts = ledger.transactions()[0].amounts;
        assert_eq!(amounts.gross, 0.0);
        assert_eq!(amounts.net_credit, 0.0);
        assert_eq!(amounts.processor_fee, 0.0);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn load_with_logs(rows: &[&str]) -> (Ledger, String) {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let ledger = tracing::subscriber::with_default(subscriber, || ledger_from(rows).unwrap());
        (ledger, logs.text())
    }

    #[test]
    fn test_non_numeric_amount_logs_warning() {
        let (ledger, logs) = load_with_logs(&[
            "2024-01-01;Sale;1;1;0;0;0;0;0;0;pix",
            "2024-01-02;Sale;abc;10,50;0;0;0;0;0;0;pix",
        ]);
        assert_eq!(ledger.transactions()[1].amounts.gross, 0.0);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("non-numeric amount treated as zero"));
        assert!(logs.contains("GROSS_AMOUNT"));
        assert!(logs.contains("NET_CREDIT_AMOUNT"));
        assert!(logs.contains("line=3"));
        assert!(logs.contains("abc"));
    }

    #[test]
    fn test_empty_and_numeric_amounts_do_not_warn() {
        let (_, logs) = load_with_logs(&["2024-01-01;Sale;;1,234.50;0;-5;0;0;0;0;pix"]);
        assert!(logs.is_empty(), "unexpected warnings: {logs}");
    }

    #[test]
    fn test_load_parses_rows_in_file_order() {
        let ledger = ledger_from(&[
            "2024-01-02T10:00:00.000-03:00;Sale A;100;95;0;-5;0;0;0;0;credit_card",
            "2024-01-01;Withdrawal;0;0;30;0;0;-2.5;0;0;account_money",
        ])
        .unwrap();
        assert_eq!(ledger.len(), 2);
        let first = &ledger.transactions()[0];
        assert_eq!(first.date, date(2024, 1, 2));
        assert_eq!(first.description, "Sale A");
        assert_eq!(first.amounts.gross, 100.0);
        assert_eq!(first.amounts.net_credit, 95.0);
        assert_eq!(first.amounts.processor_fee, -5.0);
        assert_eq!(first.payment_method, "credit_card");
        assert_eq!(ledger.transactions()[1].amounts.shipping_fee, -2.5);
        assert_eq!(ledger.dates(), vec![date(2024, 1, 1), date(2024, 1, 2)]);
    }

    #[test]
    fn test_load_empty_cells_are_zero() {
        let ledger = ledger_from(&["2024-01-01;Sale;;;;;;;;;pix"]).unwrap();
        assert_eq!(ledger.transactions()[0].amounts, Amounts::default());
    }

    #[test]
    fn test_load_non_numeric_amount_is_zero() {
        let ledger = ledger_from(&["2024-01-01;Sale;abc;10;0;0;0;0;0;0;pix"]).unwrap();
        let amounts = ledger.transactions()[0].amounts;
        assert_eq!(amounts.gross, 0.0);
        assert_eq!(amounts.net_credit, 10.0);
    }

    #[test]
    fn test_load_rejects_bad_date() {
        let err = ledger_from(&[
            "2024-01-01;Sale;1;1;0;0;0;0;0;0;pix",
            "not-a-date;Sale;1;1;0;0;0;0;0;0;pix",
        ])
        .unwrap_err();
        match err {
            LoadError::InvalidDate { line, value } => {
                assert_eq!(line, 3);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_reports_all_missing_columns() {
        let content = "DATE;DESCRIPTION;GROSS_AMOUNT\n2024-01-01;Sale;1\n";
        let err = Ledger::from_reader(content.as_bytes(), b';').unwrap_err();
        match err {
            LoadError::MissingColumns(cols) => {
                assert_eq!(cols.len(), 8);
                assert!(cols.contains(&"PAYMENT_METHOD".to_string()));
                assert!(cols.contains(&"MP_FEE_AMOUNT".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_ignores_extra_columns_and_honours_delimiter() {
        let content = format!(
            "{},EXTERNAL_REFERENCE\n2024-01-01,Sale,1,1,0,0,0,0,0,0,pix,ref-1\n",
            HEADER.replace(';', ",")
        );
        let ledger = Ledger::from_reader(content.as_bytes(), b',').unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.csv"), b';').unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_reformat_rewrites_dates_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ledger.csv");
        let output = dir.path().join("ledger_formatted.csv");
        std::fs::write(
            &input,
            format!(
                "{HEADER}\n01/15/2024;Sale A;100.50;95;0;-5.5;0;0;0;0;credit_card\n\
                 2024-01-16T09:15:00.000-03:00;\"Sale; B\";20;20;0;0;0;0;0;0;pix\n"
            ),
        )
        .unwrap();

        let rows = reformat(&input, &output, b';').unwrap();
        assert_eq!(rows, 2);
        let content = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines[1], "2024-01-15;Sale A;100.50;95;0;-5.5;0;0;0;0;credit_card");
        assert_eq!(lines[2], "2024-01-16;\"Sale; B\";20;20;0;0;0;0;0;0;pix");
    }

    #[test]
    fn test_reformat_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ledger.csv");
        let once = dir.path().join("once.csv");
        let twice = dir.path().join("twice.csv");
        std::fs::write(
            &input,
            format!("{HEADER}\r\n2024-01-01 15:30:00;Sale;1;1;0;0;0;0;0;0;pix\r\n"),
        )
        .unwrap();

        reformat(&input, &once, b';').unwrap();
        reformat(&once, &twice, b';').unwrap();
        assert_eq!(std::fs::read(&once).unwrap(), std::fs::read(&twice).unwrap());
    }

    #[test]
    fn test_reformat_bad_date_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ledger.csv");
        let output = dir.path().join("out.csv");
        std::fs::write(&input, format!("{HEADER}\nsoon;Sale;1;1;0;0;0;0;0;0;pix\n")).unwrap();
        assert!(reformat(&input, &output, b';').is_err());
        assert!(!output.exists());
    }
}
