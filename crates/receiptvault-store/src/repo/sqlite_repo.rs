//! SQLite implementation of the receipt storage boundary
//!
//! Every mutating method runs in one `BEGIN IMMEDIATE` transaction, so the
//! pointer check in [`append_version`](ReceiptStore::append_version) and the
//! write it guards cannot interleave with another writer on the same file.

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use receiptvault_core::errors::{ExError, ExErrorKind, ReceiptError};
use receiptvault_core::model::{
    AuditLogEntry, BatchOutcome, BatchStatus, Page, PageRequest, Receipt, ReceiptDetail,
    ReceiptFilter, ReceiptStatus, ReceiptVersion, UploadBatch,
};
use receiptvault_core::store::{ReceiptStore, VersionAppend};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};

use super::rows::{
    field_order, millis, AuditRow, BatchRow, ReceiptRow, VersionRow, AUDIT_COLUMNS,
    BATCH_COLUMNS, DATE_FORMAT, RECEIPT_COLUMNS, RECEIPT_COLUMN_COUNT, VERSION_COLUMNS,
};
use crate::db;
use crate::errors::{sqlite_op, Result};
use crate::migrations::apply_migrations;

/// Durable [`ReceiptStore`] over one SQLite connection
pub struct SqliteReceiptStore {
    conn: Mutex<Connection>,
}

impl SqliteReceiptStore {
    /// Open (creating if needed) and migrate the database at `path`
    ///
    /// # Errors
    ///
    /// `Persistence` when the file cannot be opened or a migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(db::open(path)?)
    }

    /// # Errors
    ///
    /// `Persistence` when a migration fails.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    /// # Errors
    ///
    /// `Persistence` when a migration fails.
    pub fn from_connection(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn insert_version(conn: &Connection, version: &ReceiptVersion) -> Result<()> {
    let fees = &version.fields.fees;
    conn.execute(
        "INSERT INTO receipt_versions (
            id, receipt_id, version_number, student_name, class_name, payment_mode, date,
            annual_fee, tuition_fee, kit_books_fee, activity_fee, uniform_fee,
            source, batch_id, actor, created_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            version.id,
            version.receipt_id,
            version.version_number,
            version.fields.student_name,
            version.fields.class_name,
            version.fields.payment_mode.as_str(),
            version.fields.date.format(DATE_FORMAT).to_string(),
            fees.annual_fee.to_string(),
            fees.tuition_fee.to_string(),
            fees.kit_books_fee.to_string(),
            fees.activity_fee.to_string(),
            fees.uniform_fee.to_string(),
            version.source.as_str(),
            version.batch_id,
            version.actor.as_ref().map(|a| a.as_str()),
            millis(version.created_at),
        ],
    )
    .map_err(sqlite_op("insert_version"))?;
    Ok(())
}

fn insert_audit_entry(conn: &Connection, entry: &AuditLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO audit_logs (
            id, receipt_id, version_id, version_number, field_name, field_order,
            old_value, new_value, actor, changed_at, reason
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            entry.id,
            entry.receipt_id,
            entry.version_id,
            entry.version_number,
            entry.field_name.as_str(),
            field_order(entry.field_name),
            entry.old_value,
            entry.new_value,
            entry.actor.as_ref().map(|a| a.as_str()),
            millis(entry.changed_at),
            entry.reason,
        ],
    )
    .map_err(sqlite_op("insert_audit_entry"))?;
    Ok(())
}

fn query_batch(conn: &Connection, batch_id: &str) -> Result<Option<UploadBatch>> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM upload_batches WHERE id = ?1", BATCH_COLUMNS),
            [batch_id],
            BatchRow::read,
        )
        .optional()
        .map_err(sqlite_op("get_batch"))?;
    row.map(BatchRow::into_batch).transpose()
}

fn missing_receipt(op: &str, receipt_id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op)
        .with_entity_id(receipt_id)
        .with_message("receipt not found")
}

/// `%text%` for LIKE, with the pattern characters escaped
fn like_pattern(text: &str) -> Value {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Value::Text(format!("%{}%", escaped))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// WHERE clause and its bound values for a receipt search
fn search_clause(filter: &ReceiptFilter) -> (String, Vec<Value>) {
    let mut conditions: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(status) = filter.status {
        conditions.push("r.status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(query) = non_blank(&filter.query) {
        conditions.push(
            "(r.receipt_number LIKE ? ESCAPE '\\' OR v.student_name LIKE ? ESCAPE '\\')",
        );
        values.push(like_pattern(query));
        values.push(like_pattern(query));
    }
    if let Some(name) = non_blank(&filter.student_name) {
        conditions.push("v.student_name LIKE ? ESCAPE '\\'");
        values.push(like_pattern(name));
    }
    if let Some(class_name) = non_blank(&filter.class_name) {
        conditions.push("v.class_name LIKE ? ESCAPE '\\'");
        values.push(like_pattern(class_name));
    }
    if let Some(mode) = filter.payment_mode {
        conditions.push("v.payment_mode = ?");
        values.push(Value::Text(mode.as_str().to_string()));
    }
    if let Some(from) = filter.date_from {
        conditions.push("v.date >= ?");
        values.push(Value::Text(from.format(DATE_FORMAT).to_string()));
    }
    if let Some(to) = filter.date_to {
        conditions.push("v.date <= ?");
        values.push(Value::Text(to.format(DATE_FORMAT).to_string()));
    }

    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

impl ReceiptStore for SqliteReceiptStore {
    fn find_receipt(&self, receipt_number: &str) -> Result<Option<Receipt>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM receipts r WHERE r.receipt_number = ?1",
                    RECEIPT_COLUMNS
                ),
                [receipt_number],
                |row| ReceiptRow::read(row, 0),
            )
            .optional()
            .map_err(sqlite_op("find_receipt"))?;
        row.map(ReceiptRow::into_receipt).transpose()
    }

    fn get_version(&self, version_id: &str) -> Result<Option<ReceiptVersion>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM receipt_versions v WHERE v.id = ?1",
                    VERSION_COLUMNS
                ),
                [version_id],
                |row| VersionRow::read(row, 0),
            )
            .optional()
            .map_err(sqlite_op("get_version"))?;
        row.map(VersionRow::into_version).transpose()
    }

    fn create_receipt(&self, receipt: &Receipt, initial: &ReceiptVersion) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sqlite_op("create_receipt"))?;

        tx.execute(
            "INSERT INTO receipts (id, receipt_number, status, current_version_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                receipt.id,
                receipt.receipt_number,
                receipt.status.as_str(),
                initial.id,
                millis(receipt.created_at),
                millis(receipt.updated_at),
            ],
        )
        .map_err(sqlite_op("create_receipt"))?;
        insert_version(&tx, initial)?;

        tx.commit().map_err(sqlite_op("create_receipt"))?;
        tracing::debug!(
            receipt_number = %receipt.receipt_number,
            version_id = %initial.id,
            "receipt created"
        );
        Ok(())
    }

    fn append_version(&self, append: &VersionAppend) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sqlite_op("append_version"))?;

        let current: Option<(String, Option<String>)> = tx
            .query_row(
                "SELECT status, current_version_id FROM receipts WHERE id = ?1",
                [&append.receipt_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sqlite_op("append_version"))?;
        let Some((status, pointer)) = current else {
            return Err(missing_receipt("append_version", &append.receipt_id));
        };

        if status == ReceiptStatus::Voided.as_str() {
            return Err(ReceiptError::ReceiptVoided {
                receipt_number: append.receipt_number.clone(),
            }
            .into());
        }
        if pointer != append.expected_current {
            return Err(ExError::from(ReceiptError::StaleCurrentVersion {
                receipt_number: append.receipt_number.clone(),
                expected: append.expected_current.clone(),
                actual: pointer,
            })
            .with_op("append_version"));
        }

        insert_version(&tx, &append.version)?;
        tx.execute(
            "UPDATE receipts SET current_version_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                append.version.id,
                millis(append.version.created_at),
                append.receipt_id
            ],
        )
        .map_err(sqlite_op("append_version"))?;
        for entry in &append.audit_entries {
            insert_audit_entry(&tx, entry)?;
        }

        tx.commit().map_err(sqlite_op("append_version"))?;
        Ok(())
    }

    fn set_receipt_status(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let changed = conn
            .execute(
                "UPDATE receipts SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), millis(at), receipt_id],
            )
            .map_err(sqlite_op("set_receipt_status"))?;
        if changed == 0 {
            return Err(missing_receipt("set_receipt_status", receipt_id));
        }
        Ok(())
    }

    fn list_versions(&self, receipt_id: &str) -> Result<Vec<ReceiptVersion>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM receipt_versions v WHERE v.receipt_id = ?1
                 ORDER BY v.version_number DESC",
                VERSION_COLUMNS
            ))
            .map_err(sqlite_op("list_versions"))?;
        let rows = stmt
            .query_map([receipt_id], |row| VersionRow::read(row, 0))
            .map_err(sqlite_op("list_versions"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sqlite_op("list_versions"))?;
        rows.into_iter().map(VersionRow::into_version).collect()
    }

    fn list_audit_entries(&self, receipt_id: &str) -> Result<Vec<AuditLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM audit_logs WHERE receipt_id = ?1
                 ORDER BY version_number DESC, field_order ASC",
                AUDIT_COLUMNS
            ))
            .map_err(sqlite_op("list_audit_entries"))?;
        let rows = stmt
            .query_map([receipt_id], AuditRow::read)
            .map_err(sqlite_op("list_audit_entries"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sqlite_op("list_audit_entries"))?;
        rows.into_iter().map(AuditRow::into_entry).collect()
    }

    fn version_at(&self, receipt_id: &str, at: DateTime<Utc>) -> Result<Option<ReceiptVersion>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM receipt_versions v
                     WHERE v.receipt_id = ?1 AND v.created_at <= ?2
                     ORDER BY v.version_number DESC LIMIT 1",
                    VERSION_COLUMNS
                ),
                params![receipt_id, millis(at)],
                |row| VersionRow::read(row, 0),
            )
            .optional()
            .map_err(sqlite_op("version_at"))?;
        row.map(VersionRow::into_version).transpose()
    }

    fn search_receipts(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<ReceiptDetail>> {
        let (clause, mut values) = search_clause(filter);
        let from = "FROM receipts r LEFT JOIN receipt_versions v ON v.id = r.current_version_id";

        let conn = self.conn.lock();
        let total: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) {} {}", from, clause),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )
            .map_err(sqlite_op("search_receipts"))?;

        values.push(Value::Integer(page.limit() as i64));
        values.push(Value::Integer(page.offset() as i64));
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {}, {} {} {} ORDER BY r.created_at DESC, r.id DESC LIMIT ? OFFSET ?",
                RECEIPT_COLUMNS, VERSION_COLUMNS, from, clause
            ))
            .map_err(sqlite_op("search_receipts"))?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((
                    ReceiptRow::read(row, 0)?,
                    VersionRow::read_optional(row, RECEIPT_COLUMN_COUNT)?,
                ))
            })
            .map_err(sqlite_op("search_receipts"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sqlite_op("search_receipts"))?;

        let items = rows
            .into_iter()
            .map(|(receipt, version)| {
                Ok(ReceiptDetail {
                    receipt: receipt.into_receipt()?,
                    current_version: version.map(VersionRow::into_version).transpose()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }

    fn create_batch(&self, batch: &UploadBatch) -> Result<()> {
        let error_log = serde_json::to_string(&batch.error_log)?;
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO upload_batches (
                id, file_name, uploaded_by, uploaded_at, status, inserted, updated, failed,
                total_rows, error_log, finished_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                batch.id,
                batch.file_name,
                batch.uploaded_by.as_ref().map(|a| a.as_str()),
                millis(batch.uploaded_at),
                batch.status.as_str(),
                batch.inserted,
                batch.updated,
                batch.failed,
                batch.total_rows,
                error_log,
                batch.finished_at.map(millis),
            ],
        )
        .map_err(sqlite_op("create_batch"))?;
        Ok(())
    }

    fn finalize_batch(
        &self,
        batch_id: &str,
        outcome: &BatchOutcome,
        at: DateTime<Utc>,
    ) -> Result<UploadBatch> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sqlite_op("finalize_batch"))?;

        let mut batch = query_batch(&tx, batch_id)?.ok_or_else(|| {
            ExError::from(ReceiptError::BatchNotFound {
                batch_id: batch_id.to_string(),
            })
            .with_op("finalize_batch")
        })?;
        if batch.status != BatchStatus::Processing || !outcome.status.is_terminal() {
            return Err(ExError::from(ReceiptError::IllegalBatchTransition {
                batch_id: batch_id.to_string(),
                from: batch.status.to_string(),
                to: outcome.status.to_string(),
            })
            .with_op("finalize_batch"));
        }

        batch.finish(outcome.clone(), at);
        let error_log = serde_json::to_string(&batch.error_log)?;
        tx.execute(
            "UPDATE upload_batches
             SET status = ?1, inserted = ?2, updated = ?3, failed = ?4, total_rows = ?5,
                 error_log = ?6, finished_at = ?7
             WHERE id = ?8",
            params![
                batch.status.as_str(),
                batch.inserted,
                batch.updated,
                batch.failed,
                batch.total_rows,
                error_log,
                batch.finished_at.map(millis),
                batch.id,
            ],
        )
        .map_err(sqlite_op("finalize_batch"))?;

        tx.commit().map_err(sqlite_op("finalize_batch"))?;
        Ok(batch)
    }

    fn get_batch(&self, batch_id: &str) -> Result<Option<UploadBatch>> {
        let conn = self.conn.lock();
        query_batch(&conn, batch_id)
    }

    fn list_batches(&self, page: PageRequest) -> Result<Page<UploadBatch>> {
        let conn = self.conn.lock();
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM upload_batches", [], |row| row.get(0))
            .map_err(sqlite_op("list_batches"))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM upload_batches ORDER BY uploaded_at DESC, id DESC LIMIT ?1 OFFSET ?2",
                BATCH_COLUMNS
            ))
            .map_err(sqlite_op("list_batches"))?;
        let rows = stmt
            .query_map(
                params![page.limit() as i64, page.offset() as i64],
                BatchRow::read,
            )
            .map_err(sqlite_op("list_batches"))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(sqlite_op("list_batches"))?;

        let items = rows
            .into_iter()
            .map(BatchRow::into_batch)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(items, total.max(0) as u64, page))
    }
}
