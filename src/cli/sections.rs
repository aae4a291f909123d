use anyhow::Result;
use comfy_table::{Cell, Table};

use stmtx::config::StatementConfig;
use stmtx::settings::{load_settings, resolve_config_dir};

pub fn run(statement_type: Option<&str>, config_dir: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let statement_type = super::statement_type(statement_type, &settings)?;
    let dir = resolve_config_dir(config_dir, &settings);
    let config = StatementConfig::load(&dir, statement_type)?;

    let mut table = Table::new();
    table.set_header(vec!["Order", "Id", "Title", "Keywords", "Reads", "Skip"]);
    for section in config.sections() {
        let reads = match (&section.table, section.fields.len()) {
            (Some(t), _) => format!("{} columns", t.columns.len()),
            (None, 0) => String::new(),
            (None, n) => format!("{n} fields"),
        };
        table.add_row(vec![
            Cell::new(section.order),
            Cell::new(section.kind.id()),
            Cell::new(&section.title),
            Cell::new(section.search_keywords.join(", ")),
            Cell::new(reads),
            Cell::new(if section.skip { "yes" } else { "" }),
        ]);
    }
    println!("{} ({})\n{table}", statement_type.name(), statement_type.key());
    Ok(())
}
