//! `.xlsx` workbooks as a tabular source
//!
//! Only the first worksheet is read. Cells keep the type the workbook
//! stored them with: numeric cells (serial dates, plain amounts) come
//! through as [`CellValue::Number`], string cells as [`CellValue::Text`]
//! exactly as written, so a text receipt number like `007` keeps its
//! leading zeros.

use std::path::{Path, PathBuf};

use receiptvault_core::ingest::{CellValue, Grid, TabularSource};
use receiptvault_core::errors::{ExError, ExErrorKind};
use umya_spreadsheet::CellRawValue;

use crate::errors::{io_error, Result};

pub struct XlsxSource {
    path: PathBuf,
    name: String,
}

impl XlsxSource {
    /// Source named after the file's base name
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn cell_to_value(cell: &umya_spreadsheet::Cell) -> CellValue {
    match cell.get_raw_value() {
        CellRawValue::Numeric(number) if number.is_finite() => CellValue::Number(*number),
        CellRawValue::Empty => CellValue::Empty,
        // lazily loaded cells carry no type yet
        CellRawValue::Lazy(raw) => match raw.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => CellValue::Number(number),
            _ => text_value(raw.to_string()),
        },
        _ => text_value(cell.get_value().into_owned()),
    }
}

fn text_value(raw: String) -> CellValue {
    if raw.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(raw)
    }
}

impl TabularSource for XlsxSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_grid(&self) -> Result<Grid> {
        let book = umya_spreadsheet::reader::xlsx::read(&self.path)
            .map_err(|e| io_error("read_workbook", e).with_entity_id(self.name.clone()))?;
        let sheet = book.get_sheet_collection().first().ok_or_else(|| {
            ExError::new(ExErrorKind::Io)
                .with_op("read_workbook")
                .with_entity_id(self.name.clone())
                .with_message("workbook has no worksheets")
        })?;

        let (max_col, max_row) = sheet.get_highest_column_and_row();
        let mut grid = Vec::with_capacity(max_row as usize);
        for row in 1..=max_row {
            let cells = (1..=max_col)
                .map(|col| {
                    sheet
                        .get_cell((col, row))
                        .map_or(CellValue::Empty, cell_to_value)
                })
                .collect();
            grid.push(cells);
        }

        tracing::debug!(
            source = %self.name,
            rows = max_row,
            columns = max_col,
            "workbook read"
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_defaults_to_file_name() {
        let source = XlsxSource::new("/tmp/uploads/feb.xlsx");
        assert_eq!(source.name(), "feb.xlsx");
        assert_eq!(source.with_name("February").name(), "February");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = XlsxSource::new("/nonexistent/receipts.xlsx");
        let err = source.read_grid().unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Io);
        assert_eq!(err.op(), Some("read_workbook"));
    }

    #[test]
    fn test_cell_keeps_stored_type() {
        let mut text = umya_spreadsheet::Cell::default();
        text.set_value_string("007");
        assert_eq!(cell_to_value(&text), CellValue::Text("007".into()));

        let mut number = umya_spreadsheet::Cell::default();
        number.set_value_number(7);
        assert_eq!(cell_to_value(&number), CellValue::Number(7.0));

        let mut blank = umya_spreadsheet::Cell::default();
        blank.set_value_string("  ");
        assert_eq!(cell_to_value(&blank), CellValue::Empty);
    }
}
