use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{Data, Dimensions, Reader, Sheets};

use crate::error::{Result, StatementError};
use crate::grid::{Cell, MergedRegion, Sheet};

/// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug).
pub fn excel_serial_to_date(serial: f64) -> Option<chrono::NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(chrono::Duration::days(serial.trunc() as i64))
}

/// Converts one calamine value into a grid cell.
pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match excel_serial_to_date(dt.as_f64()) {
            Some(date) => Cell::Date(date),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match s.get(..10).and_then(|d| d.parse().ok()) {
            Some(date) => Cell::Date(date),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Error(format!("{e:?}")),
    }
}

fn region_from_dimensions(d: &Dimensions) -> MergedRegion {
    MergedRegion::new(
        d.start.0 as usize,
        d.start.1 as usize,
        d.end.0 as usize,
        d.end.1 as usize,
    )
}

// `.xls` files report merges per sheet; a sheet calamine has no record for has none.
fn regions_from_merge_cells(cells: Option<Vec<Dimensions>>) -> Vec<MergedRegion> {
    cells
        .unwrap_or_default()
        .iter()
        .map(region_from_dimensions)
        .collect()
}

/// Read-only view of a workbook on disk.
pub struct Workbook {
    path: PathBuf,
    inner: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StatementError::InvalidFileFormat(format!(
                "{} is not a readable file",
                path.display()
            )));
        }
        let inner = calamine::open_workbook_auto(path).map_err(|e| {
            StatementError::InvalidFileFormat(format!(
                "Could not open workbook {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheet_names().len()
    }

    /// Loads the sheet at `index` with cached formula results and merged regions.
    pub fn sheet(&mut self, index: usize) -> Result<Sheet> {
        let names = self.sheet_names();
        let name = names.get(index).ok_or_else(|| {
            StatementError::EmptyInput(format!(
                "No worksheet at index {index} in {}",
                self.path.display()
            ))
        })?;

        let range = self.inner.worksheet_range(name).map_err(|e| {
            StatementError::InvalidFileFormat(format!("Failed to read sheet {name}: {e}"))
        })?;

        let mut sheet = Sheet::new(name.clone());
        let (row0, col0) = range.start().unwrap_or((0, 0));
        for (r, c, data) in range.used_cells() {
            let cell = cell_from_data(data);
            if !cell.is_empty() {
                sheet.set_cell(row0 as usize + r, col0 as usize + c, cell);
            }
        }

        // Formula cells keep the cached value calamine read alongside the expression.
        if let Ok(formulas) = self.inner.worksheet_formula(name) {
            let (frow0, fcol0) = formulas.start().unwrap_or((0, 0));
            for (r, c, expr) in formulas.used_cells() {
                let (row, col) = (frow0 as usize + r, fcol0 as usize + c);
                let cached = range
                    .get_value((row as u32, col as u32))
                    .map(cell_from_data)
                    .filter(|cell| !cell.is_empty())
                    .map(Box::new);
                sheet.set_cell(
                    row,
                    col,
                    Cell::Formula {
                        expr: expr.clone(),
                        cached,
                    },
                );
            }
        }

        for region in self.merged_regions(name)? {
            sheet.add_merged_region(region);
        }

        tracing::debug!(
            sheet = %name,
            rows = sheet.row_count(),
            merged = sheet.merged_regions().len(),
            "loaded worksheet"
        );
        Ok(sheet)
    }

    fn merged_regions(&mut self, name: &str) -> Result<Vec<MergedRegion>> {
        match &mut self.inner {
            Sheets::Xlsx(xlsx) => {
                xlsx.load_merged_regions().map_err(|e| {
                    StatementError::InvalidFileFormat(format!(
                        "Failed to load merged regions: {e}"
                    ))
                })?;
                Ok(xlsx
                    .merged_regions_by_sheet(name)
                    .into_iter()
                    .map(|(_, _, dims)| region_from_dimensions(dims))
                    .collect())
            }
            Sheets::Xls(xls) => Ok(regions_from_merge_cells(xls.worksheet_merge_cells(name))),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::normalize;

    #[test]
    fn test_excel_serial_to_date() {
        let date = excel_serial_to_date(45667.0).unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-01-10");
        assert!(excel_serial_to_date(f64::INFINITY).is_none());
    }

    #[test]
    fn test_cell_from_data_kinds() {
        assert_eq!(cell_from_data(&Data::Empty), Cell::Empty);
        assert_eq!(cell_from_data(&Data::Int(12)), Cell::Number(12.0));
        assert_eq!(normalize(&cell_from_data(&Data::Float(1234.5))), "1234.5");
        assert_eq!(normalize(&cell_from_data(&Data::Bool(true))), "true");
        assert_eq!(
            normalize(&cell_from_data(&Data::String("Balance".into()))),
            "Balance"
        );
        assert_eq!(
            normalize(&cell_from_data(&Data::DateTimeIso("2024-03-05T00:00:00".into()))),
            "05/03/2024"
        );
    }

    #[test]
    fn test_region_from_dimensions() {
        let dims = Dimensions {
            start: (2, 1),
            end: (2, 4),
        };
        assert_eq!(region_from_dimensions(&dims), MergedRegion::new(2, 1, 2, 4));
    }

    #[test]
    fn test_xls_merge_cells_become_regions() {
        let label = Dimensions {
            start: (3, 1),
            end: (3, 2),
        };
        let period = Dimensions {
            start: (4, 1),
            end: (4, 2),
        };
        assert_eq!(
            regions_from_merge_cells(Some(vec![label, period])),
            vec![MergedRegion::new(3, 1, 3, 2), MergedRegion::new(4, 1, 4, 2)]
        );
        assert!(regions_from_merge_cells(None).is_empty());
    }

    #[test]
    fn test_open_missing_file_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let err = Workbook::open(&dir.path().join("nope.xlsx")).err().unwrap();
        assert!(matches!(err, StatementError::InvalidFileFormat(_)));
    }

    #[test]
    fn test_open_garbage_file_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("statement.xlsx");
        std::fs::write(&path, b"definitely not a zip container").unwrap();
        let err = Workbook::open(&path).err().unwrap();
        assert!(matches!(err, StatementError::InvalidFileFormat(_)));
    }
}
