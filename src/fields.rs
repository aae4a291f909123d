use indexmap::IndexMap;

use crate::config::FieldConfig;
use crate::grid::{CellAddress, Cursor, Sheet};
use crate::locator::find_label_in_row;

/// Rows tried for a label, starting at the cursor row.
const LABEL_SEARCH_ROWS: usize = 5;

/// Resolves one field near the cursor. Returns an empty map when the label is
/// not found; otherwise moves the cursor onto the label cell.
pub fn resolve_field(
    sheet: &Sheet,
    cursor: &mut Cursor,
    field: &FieldConfig,
) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    let start = cursor.row;
    let Some(label) = (start..start + LABEL_SEARCH_ROWS)
        .take_while(|row| *row < sheet.row_count())
        .find_map(|row| find_label_in_row(sheet, row, &field.label))
    else {
        tracing::debug!(field = %field.name, label = %field.label, "label not found");
        return out;
    };

    let value_cell = value_address(sheet, label);
    let raw = sheet.text(value_cell.row, value_cell.col);
    cursor.move_to(label);

    match field.pattern.as_ref().and_then(|p| p.captures(&raw).map(|c| (p, c))) {
        Some((pattern, caps)) if !pattern.named_groups().is_empty() => {
            for name in pattern.named_groups() {
                if let Some(m) = caps.name(name) {
                    out.insert(name.clone(), m.as_str().to_string());
                }
            }
        }
        Some((_, caps)) => {
            let key = field
                .pattern_mapped_fields
                .first()
                .unwrap_or(&field.name)
                .clone();
            let whole = caps.get(0).map_or("", |m| m.as_str());
            out.insert(key, whole.to_string());
        }
        None => {
            out.insert(field.name.clone(), raw);
        }
    }
    tracing::debug!(field = %field.name, cell = %value_cell, values = ?out, "resolved field");
    out
}

/// Resolves `fields` in order, each search starting from where the previous one left the cursor.
pub fn resolve_fields(
    sheet: &Sheet,
    cursor: &mut Cursor,
    fields: &[FieldConfig],
) -> IndexMap<String, String> {
    let mut out = IndexMap::new();
    for field in fields {
        for (key, value) in resolve_field(sheet, cursor, field) {
            out.entry(key).or_insert(value);
        }
    }
    out
}

// The value sits right of the label, or right of the merged block the label spans.
fn value_address(sheet: &Sheet, label: CellAddress) -> CellAddress {
    let col = sheet
        .merged_region_containing(label)
        .map_or(label.col, |region| region.last_col);
    CellAddress::new(label.row, col + 1)
}
