use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use receiptvault_core_types::ActorRef;

use super::diff::{diff, FieldDiff};
use super::locks::ReceiptLocks;
use crate::errors::{ExError, ExErrorKind, ReceiptError, Result};
use crate::model::{
    AuditLogEntry, FieldUpdate, Receipt, ReceiptFields, ReceiptStatus, ReceiptVersion,
    VersionSource,
};
use crate::store::{ReceiptStore, VersionAppend};
use crate::{log_op_end, log_op_error, log_op_start};

/// Who is changing a receipt, through which path, and why
#[derive(Debug, Clone)]
pub struct ChangeContext {
    pub actor: Option<ActorRef>,
    pub source: VersionSource,
    pub batch_id: Option<String>,
    pub reason: Option<String>,
}

impl ChangeContext {
    pub fn manual_edit(actor: Option<&ActorRef>, reason: Option<&str>) -> Self {
        Self {
            actor: actor.cloned(),
            source: VersionSource::ManualEdit,
            batch_id: None,
            reason: reason.map(str::to_string),
        }
    }

    pub fn upload(actor: Option<&ActorRef>, batch_id: &str) -> Self {
        Self {
            actor: actor.cloned(),
            source: VersionSource::Upload,
            batch_id: Some(batch_id.to_string()),
            reason: None,
        }
    }

    pub fn api(actor: Option<&ActorRef>, reason: Option<&str>) -> Self {
        Self {
            source: VersionSource::Api,
            ..Self::manual_edit(actor, reason)
        }
    }
}

/// Result of a diff-driven write
#[derive(Debug, Clone)]
pub enum VersionOutcome {
    /// A new version was appended with one audit entry per change
    Created {
        version: ReceiptVersion,
        changes: FieldDiff,
    },
    /// The receipt had no current version; a first snapshot was written
    /// without audit entries
    Initialized(ReceiptVersion),
    /// Nothing changed; the current version is returned as is
    Unchanged(ReceiptVersion),
}

impl VersionOutcome {
    pub fn version(&self) -> &ReceiptVersion {
        match self {
            VersionOutcome::Created { version, .. }
            | VersionOutcome::Initialized(version)
            | VersionOutcome::Unchanged(version) => version,
        }
    }

    pub fn is_new_version(&self) -> bool {
        !matches!(self, VersionOutcome::Unchanged(_))
    }
}

/// What ingesting one parsed row did to its receipt
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Inserted(ReceiptVersion),
    Updated(VersionOutcome),
    Unchanged(ReceiptVersion),
}

/// Versioning engine over a [`ReceiptStore`]
///
/// Every write for a receipt number runs under that number's
/// [`ReceiptLocks`] slot. Clones share the store and the lock table.
pub struct VersionLedger<S: ReceiptStore + ?Sized> {
    store: Arc<S>,
    locks: Arc<ReceiptLocks>,
}

impl<S: ReceiptStore + ?Sized> Clone for VersionLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: ReceiptStore + ?Sized> VersionLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: Arc::new(ReceiptLocks::new()),
        }
    }

    /// Share a lock table with other ledgers over the same storage
    pub fn with_locks(store: Arc<S>, locks: Arc<ReceiptLocks>) -> Self {
        Self { store, locks }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn locks(&self) -> &Arc<ReceiptLocks> {
        &self.locks
    }

    /// Write version 1 of a new receipt, or the first snapshot of an
    /// existing receipt that has none
    ///
    /// # Errors
    ///
    /// `InvalidInput` for blank names, negative or out-of-range fees, or if
    /// the receipt already has a current version, `VoidedAggregate` if it
    /// is voided, `Persistence` on storage failure.
    pub fn create_initial_version(
        &self,
        receipt_number: &str,
        fields: ReceiptFields,
        ctx: &ChangeContext,
    ) -> Result<ReceiptVersion> {
        let fields = FieldUpdate::full(&fields)
            .validated()?
            .into_initial(receipt_number)?;
        self.locks.with_lock(receipt_number, || {
            match self.store.find_receipt(receipt_number)? {
                None => self.insert_new(receipt_number, fields, ctx),
                Some(receipt) if receipt.is_voided() => Err(ReceiptError::ReceiptVoided {
                    receipt_number: receipt_number.to_string(),
                }
                .into()),
                Some(receipt) if receipt.current_version_id.is_none() => {
                    self.insert_first_snapshot(&receipt, fields, ctx)
                }
                Some(_) => Err(ExError::new(ExErrorKind::InvalidInput)
                    .with_op("create_initial_version")
                    .with_entity_id(receipt_number)
                    .with_message("receipt already has versions")),
            }
        })
    }

    /// Diff `update` against the current version and append a new version
    /// if anything changed
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown receipt number, `VoidedAggregate` for a
    /// voided receipt, `InvalidInput` for blank names or negative fees,
    /// `Concurrency`/`Persistence` from storage.
    pub fn create_version(
        &self,
        receipt_number: &str,
        update: FieldUpdate,
        ctx: &ChangeContext,
    ) -> Result<VersionOutcome> {
        let update = update.validated()?;
        self.locks.with_lock(receipt_number, || {
            let receipt = self.store.find_receipt(receipt_number)?.ok_or_else(|| {
                ExError::from(ReceiptError::ReceiptNotFound {
                    receipt_number: receipt_number.to_string(),
                })
            })?;
            self.apply_update(&receipt, update, ctx)
        })
    }

    /// Manual edit entry point
    ///
    /// # Errors
    ///
    /// See [`VersionLedger::create_version`].
    pub fn update_receipt(
        &self,
        receipt_number: &str,
        update: FieldUpdate,
        actor: Option<&ActorRef>,
        reason: Option<&str>,
    ) -> Result<VersionOutcome> {
        log_op_start!("update_receipt", receipt_number = receipt_number);
        let start = Instant::now();

        let ctx = ChangeContext::manual_edit(actor, reason);
        let outcome = self
            .create_version(receipt_number, update, &ctx)
            .map_err(|e| {
                log_op_error!(
                    "update_receipt",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    receipt_number = receipt_number
                );
                e
            })?;

        let changed = match &outcome {
            VersionOutcome::Created { changes, .. } => changes.len(),
            _ => 0,
        };
        log_op_end!(
            "update_receipt",
            duration_ms = start.elapsed().as_millis() as u64,
            receipt_number = receipt_number,
            version_number = outcome.version().version_number,
            changed_fields = changed as u64
        );
        Ok(outcome)
    }

    /// Mark a receipt voided. Terminal: later edits and re-ingestion fail.
    ///
    /// The reason is recorded on the log line only; voiding changes no
    /// tracked field and therefore writes no version or audit entry.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown number, `VoidedAggregate` if already voided.
    pub fn void_receipt(
        &self,
        receipt_number: &str,
        actor: Option<&ActorRef>,
        reason: Option<&str>,
    ) -> Result<Receipt> {
        log_op_start!("void_receipt", receipt_number = receipt_number);
        let start = Instant::now();

        let result: Result<Receipt> = self.locks.with_lock(receipt_number, || {
            let mut receipt = self.store.find_receipt(receipt_number)?.ok_or_else(|| {
                ExError::from(ReceiptError::ReceiptNotFound {
                    receipt_number: receipt_number.to_string(),
                })
            })?;
            if receipt.is_voided() {
                return Err(ReceiptError::AlreadyVoided {
                    receipt_number: receipt_number.to_string(),
                }
                .into());
            }
            let now = Utc::now();
            self.store
                .set_receipt_status(&receipt.id, ReceiptStatus::Voided, now)?;
            receipt.status = ReceiptStatus::Voided;
            receipt.updated_at = now;
            Ok(receipt)
        });

        match result {
            Ok(receipt) => {
                log_op_end!(
                    "void_receipt",
                    duration_ms = start.elapsed().as_millis() as u64,
                    receipt_number = receipt_number,
                    actor = actor.map(ActorRef::as_str).unwrap_or(""),
                    reason = reason.unwrap_or("")
                );
                Ok(receipt)
            }
            Err(e) => {
                log_op_error!(
                    "void_receipt",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    receipt_number = receipt_number
                );
                Err(e)
            }
        }
    }

    /// Write one ingested row: insert, update or leave unchanged
    ///
    /// # Errors
    ///
    /// `VoidedAggregate` when the receipt is voided; storage errors
    /// otherwise. Nothing is written on error.
    pub fn ingest_row(
        &self,
        receipt_number: &str,
        fields: ReceiptFields,
        ctx: &ChangeContext,
    ) -> Result<RowOutcome> {
        let fields = fields.normalized();
        self.locks.with_lock(receipt_number, || {
            match self.store.find_receipt(receipt_number)? {
                None => self
                    .insert_new(receipt_number, fields, ctx)
                    .map(RowOutcome::Inserted),
                Some(receipt) => {
                    match self.apply_update(&receipt, FieldUpdate::full(&fields), ctx)? {
                        VersionOutcome::Unchanged(version) => Ok(RowOutcome::Unchanged(version)),
                        outcome => Ok(RowOutcome::Updated(outcome)),
                    }
                }
            }
        })
    }

    // ---- lock held from here down ----

    fn apply_update(
        &self,
        receipt: &Receipt,
        update: FieldUpdate,
        ctx: &ChangeContext,
    ) -> Result<VersionOutcome> {
        if receipt.is_voided() {
            return Err(ReceiptError::ReceiptVoided {
                receipt_number: receipt.receipt_number.clone(),
            }
            .into());
        }

        let current = match &receipt.current_version_id {
            Some(version_id) => Some(self.store.get_version(version_id)?.ok_or_else(|| {
                ExError::new(ExErrorKind::Persistence)
                    .with_op("apply_update")
                    .with_entity_id(version_id.clone())
                    .with_message("current version pointer refers to a missing version")
            })?),
            None => None,
        };

        let Some(current) = current else {
            tracing::warn!(
                receipt_number = %receipt.receipt_number,
                "receipt has no current version; writing a first snapshot"
            );
            let fields = update.into_initial(&receipt.receipt_number)?;
            return self
                .insert_first_snapshot(receipt, fields, ctx)
                .map(VersionOutcome::Initialized);
        };

        let changes = diff(&current.fields, &update);
        if changes.is_empty() {
            tracing::debug!(
                receipt_number = %receipt.receipt_number,
                version_number = current.version_number,
                "no field changes; version not created"
            );
            return Ok(VersionOutcome::Unchanged(current));
        }

        let now = Utc::now();
        let version = self.new_version(
            receipt,
            current.version_number + 1,
            update.apply_to(&current.fields),
            ctx,
            now,
        );
        let audit_entries = audit_entries_for(receipt, &version, &changes, ctx, now);

        self.store.append_version(&VersionAppend {
            receipt_id: receipt.id.clone(),
            receipt_number: receipt.receipt_number.clone(),
            expected_current: Some(current.id.clone()),
            version: version.clone(),
            audit_entries,
        })?;

        tracing::debug!(
            receipt_number = %receipt.receipt_number,
            version_number = version.version_number,
            changed_fields = changes.len() as u64,
            "version appended"
        );
        Ok(VersionOutcome::Created { version, changes })
    }

    fn insert_new(
        &self,
        receipt_number: &str,
        fields: ReceiptFields,
        ctx: &ChangeContext,
    ) -> Result<ReceiptVersion> {
        let now = Utc::now();
        let receipt = Receipt::new(receipt_number, now);
        let version = self.new_version(&receipt, 1, fields.normalized(), ctx, now);
        self.store.create_receipt(&receipt, &version)?;
        Ok(version)
    }

    fn insert_first_snapshot(
        &self,
        receipt: &Receipt,
        fields: ReceiptFields,
        ctx: &ChangeContext,
    ) -> Result<ReceiptVersion> {
        // orphaned versions may exist behind a lost pointer; never reuse a number
        let next_number = self
            .store
            .list_versions(&receipt.id)?
            .first()
            .map(|v| v.version_number + 1)
            .unwrap_or(1);

        let version = self.new_version(receipt, next_number, fields.normalized(), ctx, Utc::now());
        self.store.append_version(&VersionAppend {
            receipt_id: receipt.id.clone(),
            receipt_number: receipt.receipt_number.clone(),
            expected_current: None,
            version: version.clone(),
            audit_entries: Vec::new(),
        })?;
        Ok(version)
    }

    fn new_version(
        &self,
        receipt: &Receipt,
        version_number: u32,
        fields: ReceiptFields,
        ctx: &ChangeContext,
        now: DateTime<Utc>,
    ) -> ReceiptVersion {
        ReceiptVersion {
            id: uuid::Uuid::now_v7().to_string(),
            receipt_id: receipt.id.clone(),
            version_number,
            fields,
            source: ctx.source,
            batch_id: ctx.batch_id.clone(),
            actor: ctx.actor.clone(),
            created_at: now,
        }
    }
}

fn audit_entries_for(
    receipt: &Receipt,
    version: &ReceiptVersion,
    changes: &FieldDiff,
    ctx: &ChangeContext,
    now: DateTime<Utc>,
) -> Vec<AuditLogEntry> {
    changes
        .changes()
        .iter()
        .map(|change| AuditLogEntry {
            id: uuid::Uuid::now_v7().to_string(),
            receipt_id: receipt.id.clone(),
            version_id: version.id.clone(),
            version_number: version.version_number,
            field_name: change.field,
            old_value: change.old_value.to_string(),
            new_value: change.new_value.to_string(),
            actor: ctx.actor.clone(),
            changed_at: now,
            reason: ctx.reason.clone(),
        })
        .collect()
}
