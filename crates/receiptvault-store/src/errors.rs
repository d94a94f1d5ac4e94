//! Error handling for receiptvault-store
//!
//! Wraps receiptvault-core ExError with store-specific helpers

use receiptvault_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// An applied migration whose embedded SQL has since changed
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_entity_id(migration_id)
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Same as [`from_rusqlite`] but names the failing operation
pub fn sqlite_op(op: &'static str) -> impl Fn(rusqlite::Error) -> ExError {
    move |err| from_rusqlite(err).with_op(op)
}

/// A stored value that no longer parses into its domain type
pub fn corrupt_value(column: &str, value: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("decode_row")
        .with_entity_id(column)
        .with_message(format!("unreadable stored value '{}' in {}", value, column))
}

/// Create an IO error
pub fn io_error(operation: &str, err: impl std::fmt::Display) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
