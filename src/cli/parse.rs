use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use comfy_table::{Cell, CellAlignment, Table};

use stmtx::fmt::{amount_opt, date_opt};
use stmtx::models::AccountStatement;
use stmtx::parse_file;
use stmtx::settings::{load_settings, resolve_config_dir, shellexpand_path};

use super::OutputFormat;

pub fn run(
    file: &str,
    statement_type: Option<&str>,
    config_dir: Option<&str>,
    format: Option<OutputFormat>,
    output: Option<&str>,
) -> Result<()> {
    let settings = load_settings();
    let statement_type = super::statement_type(statement_type, &settings)?;
    let format = match format {
        Some(f) => f,
        None => OutputFormat::from_str(&settings.output_format, true)
            .map_err(|e| anyhow!("Bad output_format in settings: {e}"))?,
    };
    let dir = resolve_config_dir(config_dir, &settings);
    let path = PathBuf::from(shellexpand_path(file));

    let statement = parse_file(&path, statement_type, &dir)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let rendered = match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&statement)?),
        OutputFormat::Table => render_table(&statement),
        OutputFormat::Csv => render_csv(&statement)?,
    };

    match output {
        Some(out) => {
            std::fs::write(out, &rendered).with_context(|| format!("Could not write {out}"))?;
            println!(
                "Wrote {} transactions ({} with errors) to {out}",
                statement.transaction_records.len(),
                statement.error_count()
            );
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render_table(statement: &AccountStatement) -> String {
    let info = &statement.transaction_info;
    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let mut out = format!(
        "Account:  {}\nName:     {}\nCurrency: {}\nPeriod:   {} to {}\n\n",
        dash(&info.account_number),
        dash(&info.full_name),
        dash(&info.currency),
        date_opt(info.transaction_from),
        date_opt(info.transaction_to),
    );

    let mut table = Table::new();
    table.set_header(vec![
        "S No.",
        "Value Date",
        "Txn Date",
        "Cheque",
        "Remarks",
        "Withdrawal",
        "Deposit",
        "Balance",
        "Error",
    ]);
    for r in &statement.transaction_records {
        table.add_row(vec![
            Cell::new(r.serial_number.map(|n| n.to_string()).unwrap_or_default()),
            Cell::new(date_opt(r.value_date)),
            Cell::new(date_opt(r.transaction_date)),
            Cell::new(r.check_number.as_deref().unwrap_or("")),
            Cell::new(r.transaction_remarks.as_deref().unwrap_or("")),
            Cell::new(amount_opt(r.withdrawal_amount)).set_alignment(CellAlignment::Right),
            Cell::new(amount_opt(r.deposit_amount)).set_alignment(CellAlignment::Right),
            Cell::new(amount_opt(r.balance)).set_alignment(CellAlignment::Right),
            Cell::new(r.error.as_deref().unwrap_or("")),
        ]);
    }
    out.push_str(&format!(
        "Transactions ({}, {} with errors)\n{table}\n",
        statement.transaction_records.len(),
        statement.error_count()
    ));
    out
}

fn render_csv(statement: &AccountStatement) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for record in &statement.transaction_records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| anyhow!("{e}"))?;
    Ok(String::from_utf8(bytes)?)
}
