use std::time::Instant;

use serde::Serialize;

use super::headers::resolve_headers;
use super::row::{parse_row, ParsedRow, RowError};
use super::source::TabularSource;
use crate::errors::{ExError, ReceiptError, Result};
use crate::{log_op_end, log_op_error, log_op_start};

/// Row errors returned in a summary
pub const MAX_REPORTED_ERRORS: usize = 50;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    /// Non-empty data rows
    pub total_rows: u32,
    pub valid_rows: u32,
    pub invalid_rows: u32,
    /// All row errors, including those past the reporting cap
    pub error_count: u32,
    /// The first [`MAX_REPORTED_ERRORS`] row errors
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub rows: Vec<ParsedRow>,
    /// Every row error, in row order
    pub errors: Vec<RowError>,
    pub summary: IngestionSummary,
}

impl IngestionReport {
    /// Spreadsheet row numbers that failed validation, ascending, deduplicated
    pub fn invalid_row_numbers(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.errors.iter().map(|e| e.row).collect();
        rows.dedup();
        rows
    }
}

/// Read, validate and summarize a tabular source
///
/// # Errors
///
/// `HeaderValidation` when required columns are missing, `EmptySource`
/// when there is no header or no data row, and whatever the source's
/// `read_grid` fails with. No row is processed in any of these cases.
pub fn ingest<T: TabularSource + ?Sized>(source: &T) -> Result<IngestionReport> {
    log_op_start!("ingest", source = source.name());
    let start = Instant::now();

    let result = ingest_impl(source);
    match &result {
        Ok(report) => {
            log_op_end!(
                "ingest",
                duration_ms = start.elapsed().as_millis() as u64,
                row_count = u64::from(report.summary.total_rows),
                valid_rows = u64::from(report.summary.valid_rows),
                error_count = u64::from(report.summary.error_count)
            );
        }
        Err(e) => {
            log_op_error!(
                "ingest",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                source = source.name()
            );
        }
    }
    result
}

fn ingest_impl<T: TabularSource + ?Sized>(source: &T) -> Result<IngestionReport> {
    let grid = source.read_grid()?;
    let mut grid_rows = grid.iter();

    let Some(header_row) = grid_rows.next() else {
        return Err(ReceiptError::EmptySource {
            source_name: source.name().to_string(),
        }
        .into());
    };
    let headers = resolve_headers(header_row).map_err(ExError::from)?;

    let mut report = IngestionReport::default();
    for (idx, cells) in grid_rows.enumerate() {
        if cells.iter().all(|c| c.is_blank()) {
            continue;
        }
        // header is row 1, first data row is row 2
        let row_number = idx as u32 + 2;
        report.summary.total_rows += 1;

        match parse_row(row_number, cells, &headers) {
            Ok(row) => report.rows.push(row),
            Err(errors) => {
                report.summary.invalid_rows += 1;
                report.errors.extend(errors);
            }
        }
    }

    if report.summary.total_rows == 0 {
        return Err(ReceiptError::EmptySource {
            source_name: source.name().to_string(),
        }
        .into());
    }

    report.summary.valid_rows = report.rows.len() as u32;
    report.summary.error_count = report.errors.len() as u32;
    report.summary.errors = report
        .errors
        .iter()
        .take(MAX_REPORTED_ERRORS)
        .cloned()
        .collect();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use crate::ingest::source::GridSource;

    const HEADER: &[&str] = &["receipt_number", "student_name", "class_name", "payment_mode", "date"];

    #[test]
    fn test_missing_payment_mode_column_aborts() {
        let source = GridSource::from_text_rows(
            "no-mode.xlsx",
            &[
                &["receipt_number", "student_name", "class_name", "date"],
                &["R-1", "A", "1A", "2026-01-01"],
            ],
        );
        let err = ingest(&source).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::HeaderValidation);
        assert_eq!(err.details(), &["payment_mode".to_string()]);
    }

    #[test]
    fn test_header_only_file_is_empty_source() {
        let source = GridSource::from_text_rows("empty.xlsx", &[HEADER, &["", "", "", "", ""]]);
        let err = ingest(&source).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::EmptySource);
    }

    #[test]
    fn test_no_rows_at_all_is_empty_source() {
        let source = GridSource::new("blank.xlsx", Vec::new());
        assert_eq!(ingest(&source).unwrap_err().kind(), ExErrorKind::EmptySource);
    }

    #[test]
    fn test_blank_rows_are_skipped_but_numbering_is_kept() {
        let source = GridSource::from_text_rows(
            "gaps.xlsx",
            &[
                HEADER,
                &["R-1", "A", "1A", "cash", "2026-01-01"],
                &["", "", "", "", ""],
                &["R-3", "C", "1A", "cash", "not a date"],
            ],
        );
        let report = ingest(&source).unwrap();
        assert_eq!(report.summary.total_rows, 2);
        assert_eq!(report.summary.valid_rows, 1);
        assert_eq!(report.summary.invalid_rows, 1);
        assert_eq!(report.errors[0].row, 4);
        assert_eq!(report.invalid_row_numbers(), vec![4]);
    }

    #[test]
    fn test_error_list_is_capped_but_counted() {
        let mut rows: Vec<&[&str]> = vec![HEADER];
        let bad: &[&str] = &["", "x", "", "", ""];
        for _ in 0..30 {
            rows.push(bad);
        }
        let report = ingest(&GridSource::from_text_rows("bad.xlsx", &rows)).unwrap();
        assert_eq!(report.summary.invalid_rows, 30);
        assert_eq!(report.summary.error_count, 120);
        assert_eq!(report.summary.errors.len(), MAX_REPORTED_ERRORS);
        assert_eq!(report.errors.len(), 120);
    }
}
