//! Repository layer persisting the receipt ledger to SQLite

mod rows;
pub mod sqlite_repo;

pub use sqlite_repo::SqliteReceiptStore;
