//! Header row resolution

use std::collections::HashMap;

use super::source::CellValue;
use crate::errors::ReceiptError;
use crate::model::normalize_label;

/// Columns every file must have
pub const REQUIRED_HEADERS: [&str; 5] =
    ["receipt_number", "student_name", "class_name", "payment_mode", "date"];

/// Columns read when present
pub const OPTIONAL_HEADERS: [&str; 5] = [
    "annual_fee",
    "tuition_fee",
    "kit_books_fee",
    "activity_fee",
    "uniform_fee",
];

/// Accepted spellings per canonical column, matched after label normalization
static HEADER_ALIASES: &[(&str, &[&str])] = &[
    ("receipt_number", &["receipt_no", "receiptnumber", "receipt no", "receiptno"]),
    ("student_name", &["student", "name", "studentname", "student name"]),
    ("class_name", &["class", "classname", "class name", "grade"]),
    ("payment_mode", &["payment", "paymentmode", "payment mode", "mode"]),
    ("date", &["receipt_date", "receiptdate", "payment_date"]),
    ("annual_fee", &["annual", "annualfee", "annual fee"]),
    ("tuition_fee", &["tuition", "tuitionfee", "tuition fee"]),
    (
        "kit_books_fee",
        &["kit_books", "kitbooks", "kit books", "kitbooksfee", "kit books fee"],
    ),
    ("activity_fee", &["activity", "activityfee", "activity fee"]),
    ("uniform_fee", &["uniform", "uniformfee", "uniform fee"]),
];

/// Map a raw header to its canonical column name
pub fn canonical_header(raw: &str) -> Option<&'static str> {
    let label = normalize_label(raw);
    if label.is_empty() {
        return None;
    }
    if let Some(name) = REQUIRED_HEADERS
        .iter()
        .chain(OPTIONAL_HEADERS.iter())
        .find(|name| **name == label)
    {
        return Some(*name);
    }
    HEADER_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| normalize_label(a) == label))
        .map(|(name, _)| *name)
}

/// Canonical column name -> zero-based column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    columns: HashMap<&'static str, usize>,
}

impl HeaderMap {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The cell of `row` under column `name`, if both exist
    pub fn cell<'a>(&self, row: &'a [CellValue], name: &str) -> Option<&'a CellValue> {
        self.column(name).and_then(|idx| row.get(idx))
    }
}

/// Resolve the header row; the leftmost column mapping to a name wins
///
/// # Errors
///
/// `MissingHeaders` listing every required column not found, in
/// required-column order.
pub fn resolve_headers(header_row: &[CellValue]) -> Result<HeaderMap, ReceiptError> {
    let mut columns = HashMap::new();
    for (idx, cell) in header_row.iter().enumerate() {
        let Some(text) = cell.as_text() else {
            continue;
        };
        match canonical_header(&text) {
            Some(name) => {
                columns.entry(name).or_insert(idx);
            }
            None => tracing::debug!(header = %text, column = idx, "ignoring unrecognized header"),
        }
    }

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|name| !columns.contains_key(**name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ReceiptError::MissingHeaders { missing });
    }
    Ok(HeaderMap { columns })
}
