//! Audit trail reads
//!
//! Entries are only ever written by the ledger, inside the same storage
//! transaction as the version they describe. This module is read-only.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::errors::{ExError, ExErrorKind, ReceiptError, Result};
use crate::ledger::{diff, FieldDiff};
use crate::model::{AuditLogEntry, FieldUpdate, Receipt, ReceiptVersion};
use crate::store::ReceiptStore;

pub struct AuditTrail<S: ReceiptStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ReceiptStore + ?Sized> Clone for AuditTrail<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: ReceiptStore + ?Sized> AuditTrail<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn receipt(&self, receipt_number: &str) -> Result<Receipt> {
        self.store.find_receipt(receipt_number)?.ok_or_else(|| {
            ReceiptError::ReceiptNotFound {
                receipt_number: receipt_number.to_string(),
            }
            .into()
        })
    }

    /// All versions, newest first
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number.
    pub fn version_history(&self, receipt_number: &str) -> Result<Vec<ReceiptVersion>> {
        let receipt = self.receipt(receipt_number)?;
        self.store.list_versions(&receipt.id)
    }

    /// All field changes, newest transition first
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number.
    pub fn field_changes(&self, receipt_number: &str) -> Result<Vec<AuditLogEntry>> {
        let receipt = self.receipt(receipt_number)?;
        self.store.list_audit_entries(&receipt.id)
    }

    /// The version that was current at `at`; `None` if the receipt had no
    /// version yet
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number.
    pub fn version_at(
        &self,
        receipt_number: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<ReceiptVersion>> {
        let receipt = self.receipt(receipt_number)?;
        self.store.version_at(&receipt.id, at)
    }

    /// The version in effect at the end of `date` (UTC)
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number.
    pub fn version_on(
        &self,
        receipt_number: &str,
        date: NaiveDate,
    ) -> Result<Option<ReceiptVersion>> {
        let last_instant = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or_default();
        let end_of_day = Utc.from_utc_datetime(&date.and_time(last_instant));
        self.version_at(receipt_number, end_of_day)
    }

    /// Field differences between two versions of one receipt
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt or version number.
    pub fn compare_versions(
        &self,
        receipt_number: &str,
        from_version: u32,
        to_version: u32,
    ) -> Result<FieldDiff> {
        let versions = self.version_history(receipt_number)?;
        let pick = |number: u32| {
            versions
                .iter()
                .find(|v| v.version_number == number)
                .ok_or_else(|| {
                    ExError::new(ExErrorKind::NotFound)
                        .with_op("compare_versions")
                        .with_entity_id(receipt_number)
                        .with_message(format!("version {} does not exist", number))
                })
        };
        let from = pick(from_version)?;
        let to = pick(to_version)?;
        Ok(diff(&from.fields, &FieldUpdate::full(&to.fields)))
    }
}
