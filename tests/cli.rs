use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "DATE;DESCRIPTION;GROSS_AMOUNT;NET_CREDIT_AMOUNT;NET_DEBIT_AMOUNT;MP_FEE_AMOUNT;FINANCING_FEE_AMOUNT;SHIPPING_FEE_AMOUNT;TAXES_AMOUNT;COUPON_AMOUNT;PAYMENT_METHOD";

fn write_ledger(dir: &Path) -> PathBuf {
    let path = dir.join("ledger.csv");
    let rows = [
        "2024-01-15T10:00:00.000-03:00;Sale A;100;95;0;-5;0;0;0;0;credit_card",
        "2024-01-15T11:30:00.000-03:00;Sale A;50;48;0;-2;0;0;0;0;pix",
        "2024-01-15T12:00:00.000-03:00;Withdrawal;0;0;60;0;0;0;0;0;account_money",
        "2024-01-15T15:00:00.000-03:00;Shipping label;0;0;0;0;0;-8;0;0;account_money",
        "2024-01-17T09:00:00.000-03:00;Sale B;20;20;0;0;0;0;0;0;pix",
    ];
    std::fs::write(&path, format!("{HEADER}\n{}\n", rows.join("\n"))).unwrap();
    path
}

/// Command with an isolated home directory so settings never leak between tests.
fn daybook(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("daybook").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn summary_lists_each_date_with_totals() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["summary", "--file", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-15"))
        .stdout(predicate::str::contains("2024-01-17"))
        .stdout(predicate::str::contains("R$150.00"))
        .stdout(predicate::str::contains("Total"));
}

#[test]
fn day_shows_breakdown() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["day", "2024-01-15", "--file", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Gross revenue    R$143.00"))
        .stdout(predicate::str::contains("Net revenue      R$128.00"))
        .stdout(predicate::str::contains("Withdrawal"))
        .stdout(predicate::str::contains("Shipping label"));
}

#[test]
fn day_without_records_is_not_an_error() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["day", "2024-01-16", "--file", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No records for this date."));
}

#[test]
fn day_rejects_unparseable_date() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["day", "someday", "--file", ledger.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot parse date"));
}

#[test]
fn missing_file_exits_non_zero() {
    let home = TempDir::new().unwrap();

    daybook(&home)
        .args(["summary", "--file", "/nonexistent/ledger.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error:"));
}

#[test]
fn no_ledger_configured() {
    let home = TempDir::new().unwrap();

    daybook(&home)
        .arg("summary")
        .assert()
        .failure()
        .stderr(predicate::str::contains("daybook use"));
}

#[test]
fn missing_columns_are_named() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("short.csv");
    std::fs::write(&path, "DATE;DESCRIPTION\n2024-01-15;Sale\n").unwrap();

    daybook(&home)
        .args(["summary", "--file", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GROSS_AMOUNT"))
        .stderr(predicate::str::contains("PAYMENT_METHOD"));
}

#[test]
fn reformat_writes_default_output() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["reformat", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 rows written"));

    let out = std::fs::read_to_string(home.path().join("ledger_formatted.csv")).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], HEADER);
    assert!(lines[1].starts_with("2024-01-15;Sale A;100;"));
    assert!(lines[5].starts_with("2024-01-17;Sale B;"));
}

#[test]
fn use_remembers_ledger_for_later_commands() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["use", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("5 records, 2 dates"));

    daybook(&home)
        .arg("dates")
        .assert()
        .success()
        .stdout(predicate::str::contains("2024-01-15"))
        .stdout(predicate::str::contains("2024-01-17"));

    daybook(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("ledger.csv"));
}

#[test]
fn methods_and_distribution() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());
    let file = ledger.to_str().unwrap();

    daybook(&home)
        .args(["methods", "--file", file])
        .assert()
        .success()
        .stdout(predicate::str::contains("pix"))
        .stdout(predicate::str::contains("40.0%"));

    daybook(&home)
        .args(["distribution", "--bins", "4", "--file", file])
        .assert()
        .success()
        .stdout(predicate::str::contains("Net Credit Spread"))
        .stdout(predicate::str::contains("Median"));
}

#[test]
fn default_command_prints_summary_when_piped() {
    let home = TempDir::new().unwrap();
    let ledger = write_ledger(home.path());

    daybook(&home)
        .args(["--file", ledger.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily Summary"));
}
