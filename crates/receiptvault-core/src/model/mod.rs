pub mod audit;
pub mod batch;
pub mod fields;
pub mod money;
pub mod page;
pub mod payment_mode;
pub mod receipt;
pub mod version;

pub use audit::AuditLogEntry;
pub use batch::{BatchErrorEntry, BatchOutcome, BatchStatus, UploadBatch, MAX_ERROR_LOG};
pub use fields::{FeeBreakdown, FieldUpdate, FieldValue, ReceiptFields, TrackedField};
pub use page::{
    Page, PageRequest, ReceiptFilter, DEFAULT_BATCH_PAGE_SIZE, DEFAULT_RECEIPT_PAGE_SIZE,
};
pub use payment_mode::{normalize_label, PaymentMode};
pub use receipt::{Receipt, ReceiptDetail, ReceiptStatus};
pub use version::{ReceiptVersion, VersionSource};
