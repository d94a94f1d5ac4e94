use serde::{Deserialize, Serialize};

use crate::model::{BatchErrorEntry, BatchStatus, UploadBatch};

/// A run that reached its rows, whether or not every row succeeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub success: bool,
    pub batch_id: String,
    pub status: BatchStatus,
    pub inserted: u32,
    pub updated: u32,
    /// Valid rows that matched their receipt exactly; not a batch counter
    pub unchanged: u32,
    pub failed: u32,
    pub total_rows: u32,
    /// Capped at [`MAX_ERROR_LOG`](crate::model::MAX_ERROR_LOG)
    pub errors: Vec<BatchErrorEntry>,
}

/// A run that failed before any row was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchAbort {
    pub success: bool,
    pub batch_id: String,
    pub error: String,
    pub error_code: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResult {
    Completed(BatchReport),
    Aborted(BatchAbort),
}

impl BatchResult {
    pub fn batch_id(&self) -> &str {
        match self {
            BatchResult::Completed(r) => &r.batch_id,
            BatchResult::Aborted(a) => &a.batch_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchResult::Completed(_))
    }

    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            BatchResult::Completed(r) => Some(r),
            BatchResult::Aborted(_) => None,
        }
    }
}

impl BatchReport {
    pub(crate) fn from_batch(batch: &UploadBatch, unchanged: u32) -> Self {
        Self {
            success: true,
            batch_id: batch.id.clone(),
            status: batch.status,
            inserted: batch.inserted,
            updated: batch.updated,
            unchanged,
            failed: batch.failed,
            total_rows: batch.total_rows,
            errors: batch.error_log.clone(),
        }
    }
}
