//! Subcommands
//!
//! Each command prints its result as pretty JSON on stdout, except
//! `render`, which prints Markdown by default.

use std::sync::Arc;

use receiptvault_core::{ActorRef, AuditTrail, BatchOrchestrator, ReceiptQueries, VersionLedger};
use receiptvault_store::SqliteReceiptStore;
use serde::Serialize;

pub mod batch;
pub mod receipt;
pub mod render;
pub mod search;
pub mod upload;

/// Open store, its one ledger, and the acting user, shared by every command
///
/// All writers go through `ledger`, so they share one receipt lock table.
pub struct Context {
    store: Arc<SqliteReceiptStore>,
    ledger: VersionLedger<SqliteReceiptStore>,
    actor: Option<ActorRef>,
}

impl Context {
    pub fn new(store: Arc<SqliteReceiptStore>, actor: Option<ActorRef>) -> Self {
        let ledger = VersionLedger::new(Arc::clone(&store));
        Self {
            store,
            ledger,
            actor,
        }
    }

    pub fn actor(&self) -> Option<&ActorRef> {
        self.actor.as_ref()
    }

    pub fn ledger(&self) -> &VersionLedger<SqliteReceiptStore> {
        &self.ledger
    }

    /// Orchestrator over a clone of the shared ledger
    pub fn orchestrator(&self) -> BatchOrchestrator<SqliteReceiptStore> {
        BatchOrchestrator::new(self.ledger.clone())
    }

    pub fn audit(&self) -> AuditTrail<SqliteReceiptStore> {
        AuditTrail::new(Arc::clone(&self.store))
    }

    pub fn queries(&self) -> ReceiptQueries<SqliteReceiptStore> {
        ReceiptQueries::new(Arc::clone(&self.store))
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
