//! Migration framework
//!
//! Provides:
//! - Migration runner with checksums
//! - Idempotent application
//! - Embedded SQL migrations

mod checksums;
mod embedded;
mod runner;

pub use embedded::migration_ids;
pub use runner::apply_migrations;
