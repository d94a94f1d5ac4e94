use serde::{Deserialize, Serialize};

use super::cells::{parse_date, parse_fee, parse_payment_mode, parse_text};
use super::headers::HeaderMap;
use super::source::CellValue;
use crate::model::{FeeBreakdown, ReceiptFields};

/// A row that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRow {
    /// 1-based spreadsheet row; the header is row 1
    pub row: u32,
    pub receipt_number: String,
    pub fields: ReceiptFields,
}

/// One failed field of one row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: u32,
    pub message: String,
}

impl RowError {
    fn missing(row: u32, column: &str) -> Self {
        Self {
            row,
            message: format!("Row {}: Missing {}", row, column),
        }
    }

    fn invalid(row: u32, column: &str) -> Self {
        Self {
            row,
            message: format!("Row {}: Invalid or missing {}", row, column),
        }
    }
}

/// Validate one data row
///
/// Every failing required field is reported, not just the first. Fees never
/// fail a row.
pub fn parse_row(
    row_number: u32,
    cells: &[CellValue],
    headers: &HeaderMap,
) -> Result<ParsedRow, Vec<RowError>> {
    let cell = |name: &str| headers.cell(cells, name);
    let mut errors = Vec::new();

    let receipt_number = parse_text(cell("receipt_number"));
    if receipt_number.is_none() {
        errors.push(RowError::missing(row_number, "receipt_number"));
    }
    let student_name = parse_text(cell("student_name"));
    if student_name.is_none() {
        errors.push(RowError::missing(row_number, "student_name"));
    }
    let class_name = parse_text(cell("class_name"));
    if class_name.is_none() {
        errors.push(RowError::missing(row_number, "class_name"));
    }
    let payment_mode = parse_payment_mode(cell("payment_mode"));
    if payment_mode.is_none() {
        errors.push(RowError::invalid(row_number, "payment_mode"));
    }
    let date = parse_date(cell("date"));
    if date.is_none() {
        errors.push(RowError::invalid(row_number, "date"));
    }

    let fees = FeeBreakdown {
        annual_fee: parse_fee(cell("annual_fee")),
        tuition_fee: parse_fee(cell("tuition_fee")),
        kit_books_fee: parse_fee(cell("kit_books_fee")),
        activity_fee: parse_fee(cell("activity_fee")),
        uniform_fee: parse_fee(cell("uniform_fee")),
    };

    match (receipt_number, student_name, class_name, payment_mode, date) {
        (Some(receipt_number), Some(student_name), Some(class_name), Some(payment_mode), Some(date)) => {
            Ok(ParsedRow {
                row: row_number,
                receipt_number,
                fields: ReceiptFields {
                    student_name,
                    class_name,
                    payment_mode,
                    date,
                    fees,
                },
            })
        }
        _ => Err(errors),
    }
}
