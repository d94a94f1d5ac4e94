use thiserror::Error;

/// Result type alias using the canonical structured error
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling,
/// test assertions and the service layer's responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Ingestion
    /// Required columns missing from the header row; aborts the whole load
    HeaderValidation,
    /// A row failed field validation; row-scoped, tags batch error-log entries
    RowValidation,
    /// The source had a header but no data rows
    EmptySource,

    // Ledger
    /// Attempt to version (or void again) a voided receipt
    VoidedAggregate,
    NotFound,
    InvalidInput,
    /// Current pointer moved between diff and write
    Concurrency,
    /// Batch status transition not allowed (e.g. finalizing twice)
    InvalidTransition,

    // Integration/IO
    Io,
    Serialization,
    Persistence,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::HeaderValidation => "ERR_HEADER_VALIDATION",
            ExErrorKind::RowValidation => "ERR_ROW_VALIDATION",
            ExErrorKind::EmptySource => "ERR_EMPTY_SOURCE",
            ExErrorKind::VoidedAggregate => "ERR_VOIDED_AGGREGATE",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::InvalidTransition => "ERR_INVALID_TRANSITION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    message: String,
    details: Vec<String>,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            message: String::new(),
            details: Vec::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (receipt number, batch id, ...)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Attach structured details (e.g. the missing header columns)
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &[String] {
        &self.details
    }

    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for receipt operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReceiptError {
    #[error("Receipt not found: {receipt_number}")]
    ReceiptNotFound { receipt_number: String },

    #[error("Upload batch not found: {batch_id}")]
    BatchNotFound { batch_id: String },

    #[error("Cannot update a voided receipt: {receipt_number}")]
    ReceiptVoided { receipt_number: String },

    #[error("Receipt is already voided: {receipt_number}")]
    AlreadyVoided { receipt_number: String },

    #[error("Missing required headers: {}", missing.join(", "))]
    MissingHeaders { missing: Vec<String> },

    #[error("No data rows found in {source_name}")]
    EmptySource { source_name: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Receipt {receipt_number} has no current version and the update is incomplete: missing {}", missing.join(", "))]
    IncompleteInitialData {
        receipt_number: String,
        missing: Vec<String>,
    },

    #[error("Receipt {receipt_number} changed concurrently: expected current version {expected:?}, found {actual:?}")]
    StaleCurrentVersion {
        receipt_number: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("Batch {batch_id} cannot move from {from} to {to}")]
    IllegalBatchTransition {
        batch_id: String,
        from: String,
        to: String,
    },

    #[error("Fee lines of version {version_id} do not add up to its total")]
    InconsistentTotal { version_id: String },
}

/// Conversion from ReceiptError to ExError
impl From<ReceiptError> for ExError {
    fn from(err: ReceiptError) -> Self {
        let message = err.to_string();
        match err {
            ReceiptError::ReceiptNotFound { receipt_number } => {
                ExError::new(ExErrorKind::NotFound)
                    .with_entity_id(receipt_number)
                    .with_message(message)
            }
            ReceiptError::BatchNotFound { batch_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(batch_id)
                .with_message(message),
            ReceiptError::ReceiptVoided { receipt_number }
            | ReceiptError::AlreadyVoided { receipt_number } => {
                ExError::new(ExErrorKind::VoidedAggregate)
                    .with_entity_id(receipt_number)
                    .with_message(message)
            }
            ReceiptError::MissingHeaders { missing } => {
                ExError::new(ExErrorKind::HeaderValidation)
                    .with_op("resolve_headers")
                    .with_message(message)
                    .with_details(missing)
            }
            ReceiptError::EmptySource { source_name } => ExError::new(ExErrorKind::EmptySource)
                .with_entity_id(source_name)
                .with_message(message),
            ReceiptError::InvalidField { field, .. } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(field)
                .with_message(message),
            ReceiptError::IncompleteInitialData {
                receipt_number,
                missing,
            } => ExError::new(ExErrorKind::InvalidInput)
                .with_entity_id(receipt_number)
                .with_message(message)
                .with_details(missing),
            ReceiptError::StaleCurrentVersion { receipt_number, .. } => {
                ExError::new(ExErrorKind::Concurrency)
                    .with_entity_id(receipt_number)
                    .with_message(message)
            }
            ReceiptError::IllegalBatchTransition { batch_id, .. } => {
                ExError::new(ExErrorKind::InvalidTransition)
                    .with_entity_id(batch_id)
                    .with_message(message)
            }
            ReceiptError::InconsistentTotal { version_id } => {
                ExError::new(ExErrorKind::Internal)
                    .with_entity_id(version_id)
                    .with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ExError
impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        ExError::new(ExErrorKind::Serialization).with_message(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (ExErrorKind::HeaderValidation, "ERR_HEADER_VALIDATION"),
            (ExErrorKind::RowValidation, "ERR_ROW_VALIDATION"),
            (ExErrorKind::VoidedAggregate, "ERR_VOIDED_AGGREGATE"),
            (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
            (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_missing_headers_carry_details() {
        let err: ExError = ReceiptError::MissingHeaders {
            missing: vec!["payment_mode".into(), "date".into()],
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::HeaderValidation);
        assert_eq!(err.details(), &["payment_mode".to_string(), "date".to_string()]);
        assert!(err.message().contains("payment_mode, date"));
    }

    #[test]
    fn test_display_includes_code_and_entity() {
        let err: ExError = ReceiptError::ReceiptVoided {
            receipt_number: "R-1".into(),
        }
        .into();
        let text = err.to_string();
        assert!(text.starts_with("[ERR_VOIDED_AGGREGATE]"));
        assert!(text.contains("(entity_id: R-1)"));
    }

    #[test]
    fn test_source_chain_is_exposed() {
        let inner = ExError::new(ExErrorKind::Io).with_message("disk gone");
        let outer = ExError::new(ExErrorKind::Persistence).with_source(inner);
        assert_eq!(outer.source_error().map(|e| e.kind()), Some(ExErrorKind::Io));
        assert!(std::error::Error::source(&outer).is_some());
    }
}
