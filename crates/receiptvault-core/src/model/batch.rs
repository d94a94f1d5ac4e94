use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use receiptvault_core_types::ActorRef;

use crate::errors::ExErrorKind;

/// Entries kept in a batch's persisted error log
pub const MAX_ERROR_LOG: usize = 50;

/// Batch state machine: `pending -> processing -> {success | partial | failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Success,
    Partial,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Success => "success",
            BatchStatus::Partial => "partial",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Success | BatchStatus::Partial | BatchStatus::Failed
        )
    }

    pub fn can_transition_to(&self, next: BatchStatus) -> bool {
        match self {
            BatchStatus::Pending => matches!(next, BatchStatus::Processing | BatchStatus::Failed),
            BatchStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }

    /// Final status from the row counters
    ///
    /// Any failed row keeps a batch from reporting `success`; it is `partial`
    /// only if something was still written.
    pub fn from_counts(inserted: u32, updated: u32, failed: u32) -> Self {
        if failed == 0 {
            BatchStatus::Success
        } else if inserted + updated > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Failed
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchStatus::Pending),
            "processing" => Ok(BatchStatus::Processing),
            "success" => Ok(BatchStatus::Success),
            "partial" => Ok(BatchStatus::Partial),
            "failed" => Ok(BatchStatus::Failed),
            other => Err(format!("unknown batch status '{}'", other)),
        }
    }
}

/// One recorded problem of an ingestion run
///
/// Validation problems carry the spreadsheet row; write problems carry the
/// receipt number. `code` is the stable error code of the failure, when
/// one is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchErrorEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl BatchErrorEntry {
    /// A row that failed validation, tagged `ERR_ROW_VALIDATION`
    pub fn for_row(row: u32, message: impl Into<String>) -> Self {
        Self {
            row: Some(row),
            receipt_number: None,
            code: Some(ExErrorKind::RowValidation.code().to_string()),
            message: message.into(),
        }
    }

    pub fn for_receipt(receipt_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row: None,
            receipt_number: Some(receipt_number.into()),
            code: None,
            message: message.into(),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self {
            row: None,
            receipt_number: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Counters and log written when a batch reaches a terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub inserted: u32,
    pub updated: u32,
    pub failed: u32,
    pub total_rows: u32,
    pub error_log: Vec<BatchErrorEntry>,
}

impl BatchOutcome {
    /// Outcome for a run that stopped before or outside row processing
    pub fn aborted(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Failed,
            inserted: 0,
            updated: 0,
            failed: 0,
            total_rows: 0,
            error_log: vec![BatchErrorEntry::general(message)],
        }
    }
}

/// One ingestion run over one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadBatch {
    pub id: String,
    pub file_name: String,
    pub uploaded_by: Option<ActorRef>,
    pub uploaded_at: DateTime<Utc>,
    pub status: BatchStatus,
    pub inserted: u32,
    pub updated: u32,
    pub failed: u32,
    pub total_rows: u32,
    pub error_log: Vec<BatchErrorEntry>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl UploadBatch {
    /// A batch that is already `processing`
    pub fn start(
        file_name: impl Into<String>,
        uploaded_by: Option<ActorRef>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            file_name: file_name.into(),
            uploaded_by,
            uploaded_at: now,
            status: BatchStatus::Processing,
            inserted: 0,
            updated: 0,
            failed: 0,
            total_rows: 0,
            error_log: Vec::new(),
            finished_at: None,
        }
    }

    /// Apply a terminal outcome, truncating the error log
    pub fn finish(&mut self, mut outcome: BatchOutcome, now: DateTime<Utc>) {
        outcome.error_log.truncate(MAX_ERROR_LOG);
        self.status = outcome.status;
        self.inserted = outcome.inserted;
        self.updated = outcome.updated;
        self.failed = outcome.failed;
        self.total_rows = outcome.total_rows;
        self.error_log = outcome.error_log;
        self.finished_at = Some(now);
    }
}
