//! receiptvault store - SQLite persistence and spreadsheet input
//!
//! Provides:
//! - SQLite schema with an embedded, checksummed migrations framework
//! - [`SqliteReceiptStore`], the durable [`ReceiptStore`](receiptvault_core::ReceiptStore)
//! - [`XlsxSource`], a tabular source over the first worksheet of a workbook

pub mod db;
pub mod errors;
pub mod migrations;
pub mod repo;
pub mod workbook;

// Re-export key types
pub use errors::Result;
pub use repo::SqliteReceiptStore;
pub use workbook::XlsxSource;
