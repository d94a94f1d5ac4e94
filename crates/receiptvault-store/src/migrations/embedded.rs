//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

/// Migration metadata
pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations in application order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_receipt_ledger",
            sql: include_str!("../../migrations/001_receipt_ledger.sql"),
        },
        Migration {
            id: "002_upload_batches",
            sql: include_str!("../../migrations/002_upload_batches.sql"),
        },
    ]
}

pub fn migration_ids() -> Vec<&'static str> {
    get_migrations().iter().map(|m| m.id).collect()
}
