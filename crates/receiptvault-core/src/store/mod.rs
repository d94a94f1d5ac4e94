//! Storage boundary
//!
//! The ledger, audit reads and batch orchestrator depend only on
//! [`ReceiptStore`]. Every mutating method is one atomic unit: it either
//! fully applies or leaves storage untouched.

pub mod memory;

use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::model::{
    AuditLogEntry, BatchOutcome, Page, PageRequest, Receipt, ReceiptDetail, ReceiptFilter,
    ReceiptStatus, ReceiptVersion, UploadBatch,
};

pub use memory::MemoryStore;

/// A new version plus the audit entries of its transition
///
/// Applied in one transaction: insert the version, move the receipt's
/// current pointer, insert the audit entries.
#[derive(Debug, Clone)]
pub struct VersionAppend {
    pub receipt_id: String,
    pub receipt_number: String,
    /// Pointer value the diff was computed against; the append fails with
    /// `Concurrency` if storage holds something else
    pub expected_current: Option<String>,
    pub version: ReceiptVersion,
    pub audit_entries: Vec<AuditLogEntry>,
}

pub trait ReceiptStore: Send + Sync {
    fn find_receipt(&self, receipt_number: &str) -> Result<Option<Receipt>>;

    fn get_version(&self, version_id: &str) -> Result<Option<ReceiptVersion>>;

    /// Insert a receipt together with its first version, pointer set
    fn create_receipt(&self, receipt: &Receipt, initial: &ReceiptVersion) -> Result<()>;

    fn append_version(&self, append: &VersionAppend) -> Result<()>;

    fn set_receipt_status(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Newest first
    fn list_versions(&self, receipt_id: &str) -> Result<Vec<ReceiptVersion>>;

    /// Newest transition first; entries of one transition in tracked-field order
    fn list_audit_entries(&self, receipt_id: &str) -> Result<Vec<AuditLogEntry>>;

    /// Latest version created at or before `at`
    fn version_at(&self, receipt_id: &str, at: DateTime<Utc>) -> Result<Option<ReceiptVersion>>;

    /// Newest receipts first
    fn search_receipts(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<ReceiptDetail>>;

    fn create_batch(&self, batch: &UploadBatch) -> Result<()>;

    /// Move a `processing` batch to its terminal state
    ///
    /// A batch is finalized exactly once; later calls fail with
    /// `InvalidTransition`.
    fn finalize_batch(
        &self,
        batch_id: &str,
        outcome: &BatchOutcome,
        at: DateTime<Utc>,
    ) -> Result<UploadBatch>;

    fn get_batch(&self, batch_id: &str) -> Result<Option<UploadBatch>>;

    /// Newest first
    fn list_batches(&self, page: PageRequest) -> Result<Page<UploadBatch>>;
}
