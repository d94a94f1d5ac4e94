//! receiptvault core - versioning engine for financial receipts
//!
//! - Append-only version ledger with a field-level audit trail
//! - Tabular ingestion pipeline (header aliasing, per-row validation)
//! - Batch orchestrator with partial-failure accounting
//! - Storage boundary ([`ReceiptStore`]) with an in-memory implementation
//! - Receipt document handover for renderers
//!
//! Every mutation takes its actor explicitly; nothing reads an ambient
//! "current user".

pub mod audit;
pub mod batch;
pub mod errors;
pub mod ingest;
pub mod ledger;
pub mod logging_facility;
pub mod model;
pub mod queries;
pub mod render;
pub mod store;

// Re-export commonly used types
pub use audit::AuditTrail;
pub use batch::{BatchOrchestrator, BatchResult};
pub use errors::{ExError, ExErrorKind, ReceiptError, Result};
pub use ledger::{ChangeContext, VersionLedger, VersionOutcome};
pub use model::{FieldUpdate, Receipt, ReceiptFields, ReceiptVersion, TrackedField};
pub use queries::ReceiptQueries;
pub use receiptvault_core_types::ActorRef;
pub use store::{MemoryStore, ReceiptStore};
