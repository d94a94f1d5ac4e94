//! Version ledger
//!
//! Append-only history of receipt snapshots. A write computes the field diff
//! against the current version and, only when something changed, appends
//! the next version and its audit entries in one storage transaction.

pub mod diff;
pub mod locks;
pub mod version_ledger;

pub use diff::{diff, FieldChange, FieldDiff};
pub use locks::ReceiptLocks;
pub use version_ledger::{ChangeContext, RowOutcome, VersionLedger, VersionOutcome};
