//! Column lists and row decoding
//!
//! Rows are first read into plain structs inside the rusqlite closure, then
//! converted to domain types so decode failures surface as `ExError`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use receiptvault_core::errors::ExError;
use receiptvault_core::model::{
    money, AuditLogEntry, BatchErrorEntry, FeeBreakdown, Receipt, ReceiptFields, ReceiptVersion,
    TrackedField, UploadBatch,
};
use receiptvault_core::ActorRef;
use rusqlite::Row;
use rust_decimal::Decimal;

use crate::errors::{corrupt_value, Result};

pub const RECEIPT_COLUMNS: &str =
    "r.id, r.receipt_number, r.status, r.current_version_id, r.created_at, r.updated_at";
pub const RECEIPT_COLUMN_COUNT: usize = 6;

pub const VERSION_COLUMNS: &str = "v.id, v.receipt_id, v.version_number, v.student_name, \
     v.class_name, v.payment_mode, v.date, v.annual_fee, v.tuition_fee, v.kit_books_fee, \
     v.activity_fee, v.uniform_fee, v.source, v.batch_id, v.actor, v.created_at";

pub const AUDIT_COLUMNS: &str = "id, receipt_id, version_id, version_number, field_name, \
     old_value, new_value, actor, changed_at, reason";

pub const BATCH_COLUMNS: &str = "id, file_name, uploaded_by, uploaded_at, status, inserted, \
     updated, failed, total_rows, error_log, finished_at";

/// Calendar dates are stored as ISO text so they compare as text
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

fn instant(column: &str, ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| corrupt_value(column, &ms.to_string()))
}

fn parsed<T: FromStr>(column: &str, raw: &str) -> Result<T> {
    raw.parse::<T>().map_err(|_| corrupt_value(column, raw))
}

/// Stored fees must read back as in-range two-place amounts
fn decimal(column: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw)
        .ok()
        .and_then(money::checked_normalize)
        .ok_or_else(|| corrupt_value(column, raw))
}

pub struct ReceiptRow {
    id: String,
    receipt_number: String,
    status: String,
    current_version_id: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl ReceiptRow {
    pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(base)?,
            receipt_number: row.get(base + 1)?,
            status: row.get(base + 2)?,
            current_version_id: row.get(base + 3)?,
            created_at: row.get(base + 4)?,
            updated_at: row.get(base + 5)?,
        })
    }

    pub fn into_receipt(self) -> Result<Receipt> {
        Ok(Receipt {
            status: parsed("receipts.status", &self.status)?,
            created_at: instant("receipts.created_at", self.created_at)?,
            updated_at: instant("receipts.updated_at", self.updated_at)?,
            id: self.id,
            receipt_number: self.receipt_number,
            current_version_id: self.current_version_id,
        })
    }
}

pub struct VersionRow {
    id: String,
    receipt_id: String,
    version_number: u32,
    student_name: String,
    class_name: String,
    payment_mode: String,
    date: String,
    fees: [String; 5],
    source: String,
    batch_id: Option<String>,
    actor: Option<String>,
    created_at: i64,
}

impl VersionRow {
    pub fn read(row: &Row<'_>, base: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(base)?,
            receipt_id: row.get(base + 1)?,
            version_number: row.get(base + 2)?,
            student_name: row.get(base + 3)?,
            class_name: row.get(base + 4)?,
            payment_mode: row.get(base + 5)?,
            date: row.get(base + 6)?,
            fees: [
                row.get(base + 7)?,
                row.get(base + 8)?,
                row.get(base + 9)?,
                row.get(base + 10)?,
                row.get(base + 11)?,
            ],
            source: row.get(base + 12)?,
            batch_id: row.get(base + 13)?,
            actor: row.get(base + 14)?,
            created_at: row.get(base + 15)?,
        })
    }

    /// For LEFT JOINs: `None` when the joined version is absent
    pub fn read_optional(row: &Row<'_>, base: usize) -> rusqlite::Result<Option<Self>> {
        let id: Option<String> = row.get(base)?;
        match id {
            Some(_) => Self::read(row, base).map(Some),
            None => Ok(None),
        }
    }

    pub fn into_version(self) -> Result<ReceiptVersion> {
        let [annual, tuition, kit_books, activity, uniform] = self.fees;
        let fields = ReceiptFields {
            student_name: self.student_name,
            class_name: self.class_name,
            payment_mode: parsed("receipt_versions.payment_mode", &self.payment_mode)?,
            date: NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
                .map_err(|_| corrupt_value("receipt_versions.date", &self.date))?,
            fees: FeeBreakdown {
                annual_fee: decimal("receipt_versions.annual_fee", &annual)?,
                tuition_fee: decimal("receipt_versions.tuition_fee", &tuition)?,
                kit_books_fee: decimal("receipt_versions.kit_books_fee", &kit_books)?,
                activity_fee: decimal("receipt_versions.activity_fee", &activity)?,
                uniform_fee: decimal("receipt_versions.uniform_fee", &uniform)?,
            },
        };
        Ok(ReceiptVersion {
            id: self.id,
            receipt_id: self.receipt_id,
            version_number: self.version_number,
            fields,
            source: parsed("receipt_versions.source", &self.source)?,
            batch_id: self.batch_id,
            actor: self.actor.map(ActorRef::new),
            created_at: instant("receipt_versions.created_at", self.created_at)?,
        })
    }
}

pub struct AuditRow {
    id: String,
    receipt_id: String,
    version_id: String,
    version_number: u32,
    field_name: String,
    old_value: String,
    new_value: String,
    actor: Option<String>,
    changed_at: i64,
    reason: Option<String>,
}

impl AuditRow {
    pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            receipt_id: row.get(1)?,
            version_id: row.get(2)?,
            version_number: row.get(3)?,
            field_name: row.get(4)?,
            old_value: row.get(5)?,
            new_value: row.get(6)?,
            actor: row.get(7)?,
            changed_at: row.get(8)?,
            reason: row.get(9)?,
        })
    }

    pub fn into_entry(self) -> Result<AuditLogEntry> {
        let field_name = TrackedField::from_name(&self.field_name)
            .ok_or_else(|| corrupt_value("audit_logs.field_name", &self.field_name))?;
        Ok(AuditLogEntry {
            id: self.id,
            receipt_id: self.receipt_id,
            version_id: self.version_id,
            version_number: self.version_number,
            field_name,
            old_value: self.old_value,
            new_value: self.new_value,
            actor: self.actor.map(ActorRef::new),
            changed_at: instant("audit_logs.changed_at", self.changed_at)?,
            reason: self.reason,
        })
    }
}

/// Sort key keeping one transition's entries in tracked-field order
pub fn field_order(field: TrackedField) -> i64 {
    TrackedField::ALL
        .iter()
        .position(|f| *f == field)
        .map_or(i64::MAX, |idx| idx as i64)
}

pub struct BatchRow {
    id: String,
    file_name: String,
    uploaded_by: Option<String>,
    uploaded_at: i64,
    status: String,
    inserted: u32,
    updated: u32,
    failed: u32,
    total_rows: u32,
    error_log: String,
    finished_at: Option<i64>,
}

impl BatchRow {
    pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            file_name: row.get(1)?,
            uploaded_by: row.get(2)?,
            uploaded_at: row.get(3)?,
            status: row.get(4)?,
            inserted: row.get(5)?,
            updated: row.get(6)?,
            failed: row.get(7)?,
            total_rows: row.get(8)?,
            error_log: row.get(9)?,
            finished_at: row.get(10)?,
        })
    }

    pub fn into_batch(self) -> Result<UploadBatch> {
        let error_log: Vec<BatchErrorEntry> = serde_json::from_str(&self.error_log)
            .map_err(|e| ExError::from(e).with_op("decode_row").with_entity_id("upload_batches.error_log"))?;
        Ok(UploadBatch {
            status: parsed("upload_batches.status", &self.status)?,
            uploaded_at: instant("upload_batches.uploaded_at", self.uploaded_at)?,
            finished_at: self
                .finished_at
                .map(|ms| instant("upload_batches.finished_at", ms))
                .transpose()?,
            id: self.id,
            file_name: self.file_name,
            uploaded_by: self.uploaded_by.map(ActorRef::new),
            inserted: self.inserted,
            updated: self.updated,
            failed: self.failed,
            total_rows: self.total_rows,
            error_log,
        })
    }
}
