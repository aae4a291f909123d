use crate::config::SearchRange;
use crate::grid::{normalize, CellAddress, Cursor, Sheet};

/// A matched cell and its normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub address: CellAddress,
    pub text: String,
}

fn prepare_keywords<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Searches one row left to right from `start_col`. Gives up at the first cell
/// whose column is beyond `start_col + range.columns`.
pub fn find_in_row<S: AsRef<str>>(
    sheet: &Sheet,
    cursor: &mut Cursor,
    row: usize,
    keywords: &[S],
    start_col: usize,
    range: SearchRange,
) -> Option<Match> {
    let keywords = prepare_keywords(keywords);
    if keywords.is_empty() {
        return None;
    }
    let cutoff = start_col + range.columns;
    for (col, cell) in sheet.row(row)?.cells() {
        if col < start_col {
            continue;
        }
        if col > cutoff {
            return None;
        }
        let text = normalize(cell);
        let lowered = text.to_lowercase();
        if keywords.iter().any(|k| lowered.contains(k.as_str())) {
            let address = CellAddress::new(row, col);
            cursor.move_to(address);
            return Some(Match { address, text });
        }
    }
    None
}

/// [`find_in_row`] over the full width of the row.
pub fn find_in_whole_row<S: AsRef<str>>(
    sheet: &Sheet,
    cursor: &mut Cursor,
    row: usize,
    keywords: &[S],
) -> Option<Match> {
    let cells = sheet.row(row)?;
    let first = cells.first_col()?;
    let last = cells.last_col()?;
    let range = SearchRange {
        rows: 0,
        columns: last - first,
    };
    find_in_row(sheet, cursor, row, keywords, first, range)
}

/// Finds the cell in `row` whose text contains `label`. Does not move the cursor.
pub fn find_label_in_row(sheet: &Sheet, row: usize, label: &str) -> Option<CellAddress> {
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return None;
    }
    sheet.row(row)?.cells().find_map(|(col, cell)| {
        normalize(cell)
            .to_lowercase()
            .contains(&label)
            .then(|| CellAddress::new(row, col))
    })
}

/// Looks for a section heading within `range` of the cursor: rows
/// `cursor.row ..= cursor.row + range.rows`, columns up to `cursor.col + range.columns`.
pub fn locate_header<S: AsRef<str>>(
    sheet: &Sheet,
    cursor: &mut Cursor,
    keywords: &[S],
    range: SearchRange,
) -> Option<Match> {
    let start = cursor.address();
    let last_row = (start.row + range.rows).min(sheet.row_count().saturating_sub(1));
    for row in start.row..=last_row {
        if let Some(found) = find_in_row(sheet, cursor, row, keywords, start.col, range) {
            tracing::debug!(cell = %found.address, text = %found.text, "found section heading");
            return Some(found);
        }
    }
    None
}
