use chrono::{NaiveDate, NaiveDateTime};

use crate::errors::Result;

/// One spreadsheet cell, already typed by the reader
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Empty cells and whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text form; `None` when blank
    ///
    /// Whole numbers print without a fraction so a numeric receipt number
    /// `1001.0` reads back as `"1001"`.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => return None,
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Rows of cells; the first row is the header row
pub type Grid = Vec<Vec<CellValue>>;

/// Anything that can hand the pipeline a grid of cells
///
/// Implementations acquire whatever backs the grid (a file, a workbook)
/// inside `read_grid` and release it before returning, on success and on
/// failure alike.
pub trait TabularSource {
    /// File name or other label used in batch records and errors
    fn name(&self) -> &str;

    fn read_grid(&self) -> Result<Grid>;
}

/// In-memory grid
#[derive(Debug, Clone)]
pub struct GridSource {
    name: String,
    rows: Grid,
}

impl GridSource {
    pub fn new(name: impl Into<String>, rows: Grid) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Build from plain strings; `""` becomes an empty cell
    pub fn from_text_rows(name: impl Into<String>, rows: &[&[&str]]) -> Self {
        let grid = rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
            .collect();
        Self::new(name, grid)
    }
}

impl TabularSource for GridSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_grid(&self) -> Result<Grid> {
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_numbers_print_without_fraction() {
        assert_eq!(CellValue::Number(1001.0).as_text().as_deref(), Some("1001"));
        assert_eq!(CellValue::Number(12.5).as_text().as_deref(), Some("12.5"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text("   ".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert_eq!(CellValue::Text("  ".into()).as_text(), None);
    }
}
