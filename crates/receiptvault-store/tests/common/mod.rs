#![allow(dead_code)]

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use receiptvault_core::model::{FeeBreakdown, PaymentMode};
use receiptvault_core::{ReceiptFields, VersionLedger};
use receiptvault_store::SqliteReceiptStore;
use rust_decimal::Decimal;

pub const HEADER: [&str; 10] = [
    "Receipt No",
    "Student Name",
    "Class",
    "Payment Mode",
    "Date",
    "Annual Fee",
    "Tuition Fee",
    "Kit Books Fee",
    "Activity Fee",
    "Uniform Fee",
];

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn memory_store() -> Arc<SqliteReceiptStore> {
    Arc::new(SqliteReceiptStore::open_in_memory().unwrap())
}

pub fn sqlite_ledger() -> VersionLedger<SqliteReceiptStore> {
    VersionLedger::new(memory_store())
}

pub fn sample_fields(student_name: &str) -> ReceiptFields {
    ReceiptFields {
        student_name: student_name.to_string(),
        class_name: "6A".to_string(),
        payment_mode: PaymentMode::Cash,
        date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
        fees: FeeBreakdown {
            annual_fee: dec("2000.00"),
            tuition_fee: dec("4500.00"),
            kit_books_fee: dec("750.25"),
            activity_fee: dec("300.00"),
            uniform_fee: dec("0.00"),
        },
    }
}

/// One worksheet cell: a string cell, or a number written as a numeric cell
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Write `rows` into the first worksheet of a new workbook at `path`
pub fn write_workbook(path: &Path, rows: &[Vec<Cell<'_>>]) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if matches!(cell, Cell::Blank) {
                continue;
            }
            let target = sheet.get_cell_mut(((c + 1) as u32, (r + 1) as u32));
            match cell {
                Cell::Text(text) => {
                    target.set_value_string(*text);
                }
                Cell::Number(number) => {
                    target.set_value_number(*number);
                }
                Cell::Blank => {}
            }
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

pub fn header_cells() -> Vec<Cell<'static>> {
    HEADER.iter().map(|h| Cell::Text(*h)).collect()
}
