use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{ReceiptStore, VersionAppend};
use crate::errors::{ExError, ExErrorKind, ReceiptError, Result};
use crate::model::{
    AuditLogEntry, BatchOutcome, BatchStatus, Page, PageRequest, Receipt, ReceiptDetail,
    ReceiptFilter, ReceiptStatus, ReceiptVersion, UploadBatch,
};

#[derive(Debug, Default)]
struct MemoryState {
    receipts: HashMap<String, Receipt>,
    /// receipt_number -> receipt id
    receipt_numbers: HashMap<String, String>,
    versions: HashMap<String, ReceiptVersion>,
    audit: Vec<AuditLogEntry>,
    batches: HashMap<String, UploadBatch>,
}

/// In-memory [`ReceiptStore`]
///
/// One mutex over the whole state, so each method is trivially atomic.
/// Used by tests and by callers that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(op: &str, what: String) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op)
        .with_message(format!("unique constraint violated: {}", what))
}

fn missing_receipt(op: &str, receipt_id: &str) -> ExError {
    ExError::new(ExErrorKind::NotFound)
        .with_op(op)
        .with_entity_id(receipt_id)
        .with_message("receipt not found")
}

impl MemoryState {
    fn versions_of(&self, receipt_id: &str) -> Vec<ReceiptVersion> {
        let mut versions: Vec<ReceiptVersion> = self
            .versions
            .values()
            .filter(|v| v.receipt_id == receipt_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        versions
    }

    fn detail(&self, receipt: &Receipt) -> ReceiptDetail {
        ReceiptDetail {
            receipt: receipt.clone(),
            current_version: receipt
                .current_version_id
                .as_ref()
                .and_then(|id| self.versions.get(id))
                .cloned(),
        }
    }
}

impl ReceiptStore for MemoryStore {
    fn find_receipt(&self, receipt_number: &str) -> Result<Option<Receipt>> {
        let state = self.state.lock();
        Ok(state
            .receipt_numbers
            .get(receipt_number)
            .and_then(|id| state.receipts.get(id))
            .cloned())
    }

    fn get_version(&self, version_id: &str) -> Result<Option<ReceiptVersion>> {
        Ok(self.state.lock().versions.get(version_id).cloned())
    }

    fn create_receipt(&self, receipt: &Receipt, initial: &ReceiptVersion) -> Result<()> {
        let mut state = self.state.lock();
        if state.receipt_numbers.contains_key(&receipt.receipt_number) {
            return Err(unique_violation(
                "create_receipt",
                format!("receipts.receipt_number = {}", receipt.receipt_number),
            ));
        }
        if state.versions.contains_key(&initial.id) {
            return Err(unique_violation(
                "create_receipt",
                format!("receipt_versions.id = {}", initial.id),
            ));
        }

        let mut stored = receipt.clone();
        stored.current_version_id = Some(initial.id.clone());
        state
            .receipt_numbers
            .insert(stored.receipt_number.clone(), stored.id.clone());
        state.receipts.insert(stored.id.clone(), stored);
        state.versions.insert(initial.id.clone(), initial.clone());
        Ok(())
    }

    fn append_version(&self, append: &VersionAppend) -> Result<()> {
        let mut state = self.state.lock();
        let receipt = state
            .receipts
            .get(&append.receipt_id)
            .ok_or_else(|| missing_receipt("append_version", &append.receipt_id))?;

        if receipt.is_voided() {
            return Err(ReceiptError::ReceiptVoided {
                receipt_number: append.receipt_number.clone(),
            }
            .into());
        }
        if receipt.current_version_id != append.expected_current {
            return Err(ExError::from(ReceiptError::StaleCurrentVersion {
                receipt_number: append.receipt_number.clone(),
                expected: append.expected_current.clone(),
                actual: receipt.current_version_id.clone(),
            })
            .with_op("append_version"));
        }
        let number_taken = state.versions.values().any(|v| {
            v.receipt_id == append.receipt_id && v.version_number == append.version.version_number
        });
        if number_taken {
            return Err(unique_violation(
                "append_version",
                format!(
                    "receipt_versions(receipt_id, version_number) = ({}, {})",
                    append.receipt_id, append.version.version_number
                ),
            ));
        }

        let version = append.version.clone();
        if let Some(receipt) = state.receipts.get_mut(&append.receipt_id) {
            receipt.current_version_id = Some(version.id.clone());
            receipt.updated_at = version.created_at;
        }
        state.versions.insert(version.id.clone(), version);
        state.audit.extend(append.audit_entries.iter().cloned());
        Ok(())
    }

    fn set_receipt_status(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let receipt = state
            .receipts
            .get_mut(receipt_id)
            .ok_or_else(|| missing_receipt("set_receipt_status", receipt_id))?;
        receipt.status = status;
        receipt.updated_at = at;
        Ok(())
    }

    fn list_versions(&self, receipt_id: &str) -> Result<Vec<ReceiptVersion>> {
        Ok(self.state.lock().versions_of(receipt_id))
    }

    fn list_audit_entries(&self, receipt_id: &str) -> Result<Vec<AuditLogEntry>> {
        let state = self.state.lock();
        let mut entries: Vec<AuditLogEntry> = state
            .audit
            .iter()
            .filter(|e| e.receipt_id == receipt_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.version_number
                .cmp(&a.version_number)
                .then(a.field_name.cmp(&b.field_name))
        });
        Ok(entries)
    }

    fn version_at(&self, receipt_id: &str, at: DateTime<Utc>) -> Result<Option<ReceiptVersion>> {
        Ok(self
            .state
            .lock()
            .versions_of(receipt_id)
            .into_iter()
            .find(|v| v.created_at <= at))
    }

    fn search_receipts(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<ReceiptDetail>> {
        let state = self.state.lock();
        let mut matching: Vec<ReceiptDetail> = state
            .receipts
            .values()
            .map(|r| state.detail(r))
            .filter(|d| filter.matches(d))
            .collect();
        matching.sort_by(|a, b| {
            b.receipt
                .created_at
                .cmp(&a.receipt.created_at)
                .then_with(|| b.receipt.id.cmp(&a.receipt.id))
        });
        Ok(Page::from_all(matching, page))
    }

    fn create_batch(&self, batch: &UploadBatch) -> Result<()> {
        let mut state = self.state.lock();
        if state.batches.contains_key(&batch.id) {
            return Err(unique_violation(
                "create_batch",
                format!("upload_batches.id = {}", batch.id),
            ));
        }
        state.batches.insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    fn finalize_batch(
        &self,
        batch_id: &str,
        outcome: &BatchOutcome,
        at: DateTime<Utc>,
    ) -> Result<UploadBatch> {
        let mut state = self.state.lock();
        let batch = state
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| {
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
        Ok(batch.clone())
    }

    fn get_batch(&self, batch_id: &str) -> Result<Option<UploadBatch>> {
        Ok(self.state.lock().batches.get(batch_id).cloned())
    }

    fn list_batches(&self, page: PageRequest) -> Result<Page<UploadBatch>> {
        let state = self.state.lock();
        let mut batches: Vec<UploadBatch> = state.batches.values().cloned().collect();
        batches.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(Page::from_all(batches, page))
    }
}
