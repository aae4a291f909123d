use std::fmt;

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Error(String),
    /// A formula with the result cached by the application that saved the file.
    Formula {
        expr: String,
        cached: Option<Box<Cell>>,
    },
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// Canonical text of a cell. Never fails; anything without a printable
/// value normalizes to the empty string.
pub fn normalize(cell: &Cell) -> String {
    match cell {
        Cell::Empty | Cell::Error(_) => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Bool(b) => b.to_string(),
        Cell::Number(n) => format_number(*n),
        Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        Cell::Formula { cached, .. } => match cached.as_deref() {
            // A formula whose cached value is itself a formula has nothing usable.
            Some(Cell::Formula { .. }) | None => String::new(),
            Some(inner) => normalize(inner),
        },
    }
}

/// General-format rendering of a number: integral values print without a
/// fractional part, everything else is rounded to 10 places and trimmed.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return String::new();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let s = format!("{n:.0}");
        return if s == "-0" { "0".to_string() } else { s };
    }
    let s = format!("{n:.10}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// One-based `R{row}C{col}` reference.
    pub fn r1c1(&self) -> String {
        format!("R{}C{}", self.row + 1, self.col + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = self.col + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        let col: String = letters.iter().rev().collect();
        write!(f, "{col}{}", self.row + 1)
    }
}

/// Rectangular range of cells shown as one; the value lives in the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedRegion {
    pub first_row: usize,
    pub first_col: usize,
    pub last_row: usize,
    pub last_col: usize,
}

impl MergedRegion {
    pub fn new(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        (self.first_row..=self.last_row).contains(&addr.row)
            && (self.first_col..=self.last_col).contains(&addr.col)
    }
}

/// Last matched cell. Every search takes it by `&mut` and leaves it on its match,
/// so later sections search forward from where earlier ones stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub fn at(addr: CellAddress) -> Self {
        Self {
            row: addr.row,
            col: addr.col,
        }
    }

    pub fn move_to(&mut self, addr: CellAddress) {
        self.row = addr.row;
        self.col = addr.col;
    }

    pub fn address(&self) -> CellAddress {
        CellAddress::new(self.row, self.col)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn get(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col).filter(|c| !c.is_empty())
    }

    /// Populated cells in column order, with their column index.
    pub fn cells(&self) -> impl Iterator<Item = (usize, &Cell)> {
        self.cells.iter().enumerate().filter(|(_, c)| !c.is_empty())
    }

    pub fn first_col(&self) -> Option<usize> {
        self.cells().next().map(|(col, _)| col)
    }

    pub fn last_col(&self) -> Option<usize> {
        self.cells.iter().rposition(|c| !c.is_empty())
    }

    pub fn text(&self, col: usize) -> String {
        self.get(col).map(normalize).unwrap_or_default()
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
    merged: Vec<MergedRegion>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            merged: Vec::new(),
        }
    }

    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows: rows.into_iter().map(Row::new).collect(),
            merged: Vec::new(),
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Row::default);
        }
        let cells = &mut self.rows[row].cells;
        if cells.len() <= col {
            cells.resize(col + 1, Cell::Empty);
        }
        cells[col] = cell;
    }

    pub fn add_merged_region(&mut self, region: MergedRegion) {
        self.merged.push(region);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of row slots, i.e. the last row index + 1.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `None` for rows past the end and for rows without any populated cell.
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index).filter(|r| !r.is_blank())
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn text(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(normalize).unwrap_or_default()
    }

    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    pub fn merged_region_containing(&self, addr: CellAddress) -> Option<&MergedRegion> {
        self.merged.iter().find(|m| m.contains(addr))
    }

    pub fn first_populated(&self) -> Option<CellAddress> {
        self.rows.iter().enumerate().find_map(|(i, r)| {
            r.first_col().map(|col| CellAddress::new(i, col))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.first_populated().is_none()
    }
}

/// Builds a sheet of text cells; empty strings become empty cells.
#[cfg(test)]
pub(crate) fn sheet_of(rows: &[&[&str]]) -> Sheet {
    Sheet::from_rows(
        "test",
        rows.iter()
            .map(|r| {
                r.iter()
                    .map(|s| if s.is_empty() { Cell::Empty } else { Cell::text(*s) })
                    .collect()
            })
            .collect(),
    )
}
