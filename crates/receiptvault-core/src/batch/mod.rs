//! Batch orchestrator
//!
//! Runs one uploaded file through the ingestion pipeline and the ledger,
//! one row at a time, and records the run as an [`UploadBatch`].
//!
//! [`UploadBatch`]: crate::model::UploadBatch

pub mod orchestrator;
pub mod result;

pub use orchestrator::BatchOrchestrator;
pub use result::{BatchAbort, BatchReport, BatchResult};
