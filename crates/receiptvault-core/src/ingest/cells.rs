//! Cell-level parsers
//!
//! Each parser returns `None` (or zero, for fees) on bad input and leaves
//! deciding what that means to the row parser.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use super::source::CellValue;
use crate::model::{money, PaymentMode};

/// Text date formats, tried in order; the first that parses wins
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y", "%d.%m.%Y"];

/// Symbols stripped from fee text before parsing
const CURRENCY_NOISE: [char; 5] = ['₹', '$', '€', '£', ','];

/// Last serial day spreadsheets can represent (9999-12-31)
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

/// Trimmed, non-blank text
pub fn parse_text(cell: Option<&CellValue>) -> Option<String> {
    cell.and_then(CellValue::as_text)
}

pub fn parse_payment_mode(cell: Option<&CellValue>) -> Option<PaymentMode> {
    parse_text(cell).and_then(|text| PaymentMode::from_label(&text))
}

/// Spreadsheet serial day (days since 1899-12-30); the time of day is ignored
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_SERIAL_DAY {
        return None;
    }
    serial_epoch()?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub fn parse_date(cell: Option<&CellValue>) -> Option<NaiveDate> {
    match cell? {
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::Text(raw) => {
            let text = raw.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .or_else(|| text.parse::<f64>().ok().and_then(serial_to_date))
        }
        CellValue::Empty => None,
    }
}

/// Fee amount, `0.00` when missing, unparseable, negative or out of range
pub fn parse_fee(cell: Option<&CellValue>) -> Decimal {
    let parsed = match cell {
        Some(CellValue::Number(n)) if n.is_finite() => Decimal::from_str(&n.to_string()).ok(),
        Some(CellValue::Text(raw)) => {
            let cleaned: String = raw
                .chars()
                .filter(|c| !CURRENCY_NOISE.contains(c) && !c.is_whitespace())
                .collect();
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    };

    match parsed {
        Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            tracing::debug!(%amount, "negative fee replaced with zero");
            money::zero()
        }
        Some(amount) => money::checked_normalize(amount).unwrap_or_else(|| {
            tracing::debug!(%amount, "out-of-range fee replaced with zero");
            money::zero()
        }),
        None => money::zero(),
    }
}
