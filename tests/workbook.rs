use std::path::{Path, PathBuf};
use std::str::FromStr;

use assert_cmd::Command;
use chrono::NaiveDate;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Formula, Workbook};

use stmtx::grid::MergedRegion;
use stmtx::{parse_file, StatementType};

const CONFIG: &str = include_str!("../config/excelStatementConfig.json");

const HEADER: [&str; 8] = [
    "S No.",
    "Value Date",
    "Transaction Date",
    "Cheque Number",
    "Transaction Remarks",
    "Withdrawal Amount (INR )",
    "Deposit Amount (INR )",
    "Balance (INR )",
];

fn config_dir(root: &Path) -> PathBuf {
    let dir = root.join("conf");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("excelStatementConfig.json"), CONFIG).unwrap();
    dir
}

/// An ICICI-style export: labels merged across B:C with values in D, a
/// formula balance and a trailing legend below the table.
fn write_statement(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let plain = Format::new();

    sheet.write_string(0, 1, "DETAILED STATEMENT").unwrap();
    sheet.write_string(2, 1, "Search Criteria").unwrap();
    sheet.merge_range(3, 1, 3, 2, "Account Number", &plain).unwrap();
    sheet.write_string(3, 3, "001201234567 ( INR ) - A KUMAR").unwrap();
    sheet.merge_range(4, 1, 4, 2, "Transaction Period", &plain).unwrap();
    sheet.write_string(4, 3, "From 01/04/2024 To 30/04/2024").unwrap();
    sheet.write_string(8, 1, "Transactions List").unwrap();
    for (i, name) in HEADER.iter().enumerate() {
        sheet.write_string(9, 1 + i as u16, *name).unwrap();
    }

    let rows = [
        (1.0, "01/04/2024", "UPI/ACME/123", 1250.5, 0.0),
        (2.0, "03/04/2024", "NEFT-SALARY", 0.0, 50000.0),
        (3.0, "05/04/24", "ATM/CASH", 2000.0, 0.0),
    ];
    for (i, (serial, date, remarks, withdrawal, deposit)) in rows.iter().enumerate() {
        let row = 10 + i as u32;
        sheet.write_number(row, 1, *serial).unwrap();
        sheet.write_string(row, 2, *date).unwrap();
        sheet.write_string(row, 3, "05/04/2024").unwrap();
        sheet.write_string(row, 4, "-").unwrap();
        sheet.write_string(row, 5, *remarks).unwrap();
        sheet.write_number(row, 6, *withdrawal).unwrap();
        sheet.write_number(row, 7, *deposit).unwrap();
    }
    sheet.write_number(10, 8, 8749.5).unwrap();
    sheet
        .write_formula(11, 8, Formula::new("=I11+H12-G12").set_result("58749.5"))
        .unwrap();
    sheet
        .write_formula(12, 8, Formula::new("=I12+H13-G13").set_result("56749.5"))
        .unwrap();
    sheet
        .write_string(14, 5, "Legends Used in Account Statement")
        .unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn workbook_loads_cells_merges_and_cached_formulas() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statement.xlsx");
    write_statement(&path);

    let mut workbook = stmtx::workbook::Workbook::open(&path).unwrap();
    assert_eq!(workbook.sheet_count(), 1);
    let sheet = workbook.sheet(0).unwrap();

    assert_eq!(sheet.text(0, 1), "DETAILED STATEMENT");
    assert_eq!(sheet.text(10, 1), "1");
    assert_eq!(sheet.text(11, 8), "58749.5");
    assert!(sheet
        .merged_regions()
        .contains(&MergedRegion::new(3, 1, 3, 2)));
}

#[test]
fn parse_file_reads_generated_statement() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("statement.xlsx");
    write_statement(&path);

    let statement = parse_file(
        &path,
        StatementType::IciciBankSearchStatement,
        &config_dir(dir.path()),
    )
    .unwrap();

    let info = &statement.transaction_info;
    assert_eq!(info.account_number.as_deref(), Some("001201234567"));
    assert_eq!(info.currency.as_deref(), Some("INR"));
    assert_eq!(info.full_name.as_deref(), Some("A KUMAR"));
    assert_eq!(info.transaction_to, NaiveDate::from_ymd_opt(2024, 4, 30));

    let records = &statement.transaction_records;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].serial_number, Some(1));
    assert_eq!(records[0].withdrawal_amount, Some(Decimal::from_str("1250.5").unwrap()));
    assert_eq!(records[1].balance, Some(Decimal::from_str("58749.5").unwrap()));
    assert_eq!(
        records[2].error.as_deref(),
        Some("Error parsing 05/04/24 as date value.")
    );
    assert_eq!(statement.error_count(), 1);
}

#[test]
fn cli_parses_generated_statement_as_json() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("statement.xlsx");
    write_statement(&path);
    let conf = config_dir(home.path());

    Command::cargo_bin("stmtx")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("RUST_LOG")
        .args([
            "parse",
            path.to_str().unwrap(),
            "--config-dir",
            conf.to_str().unwrap(),
            "--format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"fullName\": \"A KUMAR\""))
        .stdout(predicate::str::contains("NEFT-SALARY"));
}
