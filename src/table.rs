use indexmap::IndexSet;

use crate::coerce::{coerce, RowFields};
use crate::config::{ColumnField, TableConfig};
use crate::error::{Result, StatementError};
use crate::grid::{Cursor, Sheet};
use crate::locator::find_in_whole_row;
use crate::models::TransactionRecord;

/// Consecutive blank rows tolerated inside a table; one more ends it.
const MAX_BLANK_ROWS: usize = 3;
/// A row needs at least this many non-blank fields to count as a transaction.
const MIN_FIELDS: usize = 5;
const MAX_ERROR_SEGMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub field: ColumnField,
    /// Sheet column, or `None` when no header matched.
    pub index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub header_row: usize,
    pub first_data_row: usize,
    pub columns: Vec<ColumnMapping>,
}

impl TableLayout {
    pub fn mapped_count(&self) -> usize {
        self.columns.iter().filter(|c| c.index.is_some()).count()
    }
}

/// Trimmed, lowercased, inner whitespace collapsed to single spaces.
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Finds the table below the cursor. `keywords` is the optional table title;
/// when it is found the header search starts on the row after it.
pub fn locate_table<S: AsRef<str>>(
    sheet: &Sheet,
    cursor: &mut Cursor,
    keywords: &[S],
    table: &TableConfig,
) -> Result<TableLayout> {
    let mut start = cursor.row;
    if !keywords.is_empty() {
        for row in cursor.row..sheet.row_count() {
            if let Some(title) = find_in_whole_row(sheet, cursor, row, keywords) {
                tracing::debug!(cell = %title.address, "found table title");
                start = row + 1;
                break;
            }
        }
    }

    let names = table.display_names();
    let mut header_row = None;
    for row in start..sheet.row_count() {
        if find_in_whole_row(sheet, cursor, row, &names).is_some() {
            header_row = Some(row);
            break;
        }
    }
    let header_row = header_row.ok_or_else(|| {
        StatementError::NoTransactionsFound(format!(
            "no header row with any of {names:?} at or below row {}",
            start + 1
        ))
    })?;

    let headers: Vec<(String, usize)> = sheet
        .row(header_row)
        .into_iter()
        .flat_map(|r| r.cells())
        .map(|(col, _)| (normalize_header(&sheet.text(header_row, col)), col))
        .filter(|(text, _)| !text.is_empty())
        .collect();

    let columns: Vec<ColumnMapping> = table
        .columns
        .iter()
        .map(|field| ColumnMapping {
            index: match_header(&headers, &field.display_name),
            field: field.clone(),
        })
        .collect();

    let layout = TableLayout {
        header_row,
        first_data_row: header_row + 1,
        columns,
    };
    if layout.mapped_count() == 0 {
        return Err(StatementError::NoTransactionsFound(format!(
            "none of the configured columns matched the header on row {}",
            header_row + 1
        )));
    }
    for column in layout.columns.iter().filter(|c| c.index.is_none()) {
        tracing::debug!(column = %column.field.display_name, "column not present in header");
    }
    tracing::debug!(
        header_row = header_row + 1,
        mapped = layout.mapped_count(),
        configured = layout.columns.len(),
        "located transaction table"
    );
    Ok(layout)
}

// Exact match first, then containment either way, scanning headers left to right.
fn match_header(headers: &[(String, usize)], display_name: &str) -> Option<usize> {
    let wanted = normalize_header(display_name);
    if wanted.is_empty() {
        return None;
    }
    headers
        .iter()
        .find(|(text, _)| *text == wanted)
        .or_else(|| {
            headers
                .iter()
                .find(|(text, _)| text.contains(&wanted) || wanted.contains(text.as_str()))
        })
        .map(|(_, col)| *col)
}

/// Reads data rows from `layout.first_data_row` until more than three
/// consecutive blank rows. Rows that look like noise (too few fields or too
/// many coercion errors) are skipped without ending the table.
pub fn read_transactions(sheet: &Sheet, layout: &TableLayout) -> IndexSet<TransactionRecord> {
    let keys: Vec<&str> = layout
        .columns
        .iter()
        .map(|c| c.field.mapped_to.as_str())
        .collect();
    let mut records = IndexSet::new();
    let mut blank_streak = 0;
    let mut dropped = 0;

    for row in layout.first_data_row..sheet.row_count() {
        let texts: Vec<String> = layout
            .columns
            .iter()
            .map(|c| c.index.map(|col| sheet.text(row, col)).unwrap_or_default())
            .collect();

        if texts.iter().all(|t| t.trim().is_empty()) {
            blank_streak += 1;
            if blank_streak > MAX_BLANK_ROWS {
                tracing::debug!(row = row + 1, "end of transaction table");
                break;
            }
            continue;
        }
        blank_streak = 0;

        let mut fields = RowFields::new();
        for (column, text) in layout.columns.iter().zip(&texts) {
            fields.merge(&column.field.mapped_to, coerce(text, column.field.data_type));
        }

        let filled = fields.non_blank_count(keys.iter().copied());
        if filled < MIN_FIELDS || fields.error_segments() > MAX_ERROR_SEGMENTS {
            tracing::debug!(
                row = row + 1,
                filled,
                errors = fields.error_segments(),
                "skipping non-transaction row"
            );
            dropped += 1;
            continue;
        }
        records.insert(fields.into_record());
    }

    tracing::debug!(
        records = records.len(),
        dropped,
        with_errors = records.iter().filter(|r| r.error.is_some()).count(),
        "read transaction table"
    );
    records
}
