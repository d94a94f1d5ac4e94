#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use receiptvault_core::ingest::{CellValue, GridSource};
use receiptvault_core::model::{
    AuditLogEntry, BatchOutcome, FeeBreakdown, Page, PageRequest, PaymentMode, ReceiptDetail,
    ReceiptFilter, ReceiptStatus, UploadBatch,
};
use receiptvault_core::store::VersionAppend;
use receiptvault_core::{
    ExError, ExErrorKind, MemoryStore, Receipt, ReceiptFields, ReceiptStore, ReceiptVersion,
    Result, VersionLedger,
};
use parking_lot::Mutex;
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

pub fn new_ledger() -> VersionLedger<MemoryStore> {
    VersionLedger::new(Arc::new(MemoryStore::new()))
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

/// A data row in [`HEADER`] column order
pub fn data_row(receipt_number: &str, student_name: &str, mode: &str, date: &str) -> Vec<String> {
    vec![
        receipt_number.to_string(),
        student_name.to_string(),
        "6A".to_string(),
        mode.to_string(),
        date.to_string(),
        "2000".to_string(),
        "₹4,500".to_string(),
        "750.25".to_string(),
        "300".to_string(),
        String::new(),
    ]
}

pub fn grid_source(name: &str, header: &[&str], rows: &[Vec<String>]) -> GridSource {
    let mut grid: Vec<Vec<CellValue>> = vec![header.iter().map(|h| CellValue::from(*h)).collect()];
    for row in rows {
        grid.push(row.iter().map(|c| CellValue::from(c.as_str())).collect());
    }
    GridSource::new(name, grid)
}

/// Delegates to a [`MemoryStore`] with injectable faults
///
/// - `poisoned_number`: creating this receipt fails with "disk full"
/// - `failing_finalizes`: this many `finalize_batch` calls fail first
/// - `detached`: receipts that exist but have no current version yet
pub struct FailingStore {
    pub inner: MemoryStore,
    pub poisoned_number: Option<String>,
    failing_finalizes: AtomicU32,
    detached: Mutex<HashMap<String, Receipt>>,
}

impl FailingStore {
    pub fn new(poisoned_number: &str) -> Self {
        Self {
            poisoned_number: Some(poisoned_number.to_string()),
            ..Self::healthy()
        }
    }

    pub fn healthy() -> Self {
        Self {
            inner: MemoryStore::new(),
            poisoned_number: None,
            failing_finalizes: AtomicU32::new(0),
            detached: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_failing_finalizes(self, count: u32) -> Self {
        self.failing_finalizes.store(count, Ordering::SeqCst);
        self
    }

    /// Register `receipt_number` as a receipt whose current-version pointer
    /// is unset
    pub fn with_detached_receipt(self, receipt_number: &str) -> Self {
        let receipt = Receipt::new(receipt_number, Utc::now());
        assert!(receipt.current_version_id.is_none());
        self.detached
            .lock()
            .insert(receipt_number.to_string(), receipt);
        self
    }
}

impl ReceiptStore for FailingStore {
    fn find_receipt(&self, receipt_number: &str) -> Result<Option<Receipt>> {
        if let Some(receipt) = self.detached.lock().get(receipt_number) {
            return Ok(Some(receipt.clone()));
        }
        self.inner.find_receipt(receipt_number)
    }

    fn get_version(&self, version_id: &str) -> Result<Option<ReceiptVersion>> {
        self.inner.get_version(version_id)
    }

    fn create_receipt(&self, receipt: &Receipt, initial: &ReceiptVersion) -> Result<()> {
        if self.poisoned_number.as_deref() == Some(receipt.receipt_number.as_str()) {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("create_receipt")
                .with_entity_id(receipt.receipt_number.clone())
                .with_message("disk full"));
        }
        self.inner.create_receipt(receipt, initial)
    }

    fn append_version(&self, append: &VersionAppend) -> Result<()> {
        let mut detached = self.detached.lock();
        match detached.get(&append.receipt_number) {
            Some(receipt) if receipt.id == append.receipt_id => {
                assert!(append.expected_current.is_none());
                self.inner.create_receipt(receipt, &append.version)?;
                detached.remove(&append.receipt_number);
                Ok(())
            }
            _ => self.inner.append_version(append),
        }
    }

    fn set_receipt_status(
        &self,
        receipt_id: &str,
        status: ReceiptStatus,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.inner.set_receipt_status(receipt_id, status, at)
    }

    fn list_versions(&self, receipt_id: &str) -> Result<Vec<ReceiptVersion>> {
        self.inner.list_versions(receipt_id)
    }

    fn list_audit_entries(&self, receipt_id: &str) -> Result<Vec<AuditLogEntry>> {
        self.inner.list_audit_entries(receipt_id)
    }

    fn version_at(&self, receipt_id: &str, at: DateTime<Utc>) -> Result<Option<ReceiptVersion>> {
        self.inner.version_at(receipt_id, at)
    }

    fn search_receipts(
        &self,
        filter: &ReceiptFilter,
        page: PageRequest,
    ) -> Result<Page<ReceiptDetail>> {
        self.inner.search_receipts(filter, page)
    }

    fn create_batch(&self, batch: &UploadBatch) -> Result<()> {
        self.inner.create_batch(batch)
    }

    fn finalize_batch(
        &self,
        batch_id: &str,
        outcome: &BatchOutcome,
        at: DateTime<Utc>,
    ) -> Result<UploadBatch> {
        let pending = self.failing_finalizes.load(Ordering::SeqCst);
        if pending > 0 {
            self.failing_finalizes.store(pending - 1, Ordering::SeqCst);
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("finalize_batch")
                .with_entity_id(batch_id)
                .with_message("database is locked"));
        }
        self.inner.finalize_batch(batch_id, outcome, at)
    }

    fn get_batch(&self, batch_id: &str) -> Result<Option<UploadBatch>> {
        self.inner.get_batch(batch_id)
    }

    fn list_batches(&self, page: PageRequest) -> Result<Page<UploadBatch>> {
        self.inner.list_batches(page)
    }
}
