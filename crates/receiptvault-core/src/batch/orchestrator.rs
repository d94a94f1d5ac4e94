use std::time::Instant;

use chrono::Utc;
use receiptvault_core_types::ActorRef;

use super::result::{BatchAbort, BatchReport, BatchResult};
use crate::errors::{ExError, Result};
use crate::ingest::{ingest, IngestionReport, TabularSource};
use crate::ledger::{ChangeContext, RowOutcome, VersionLedger};
use crate::model::{BatchErrorEntry, BatchOutcome, BatchStatus, UploadBatch};
use crate::store::ReceiptStore;
use crate::{log_op_end, log_op_error, log_op_start};

#[derive(Debug, Default)]
struct RowTally {
    inserted: u32,
    updated: u32,
    unchanged: u32,
    failed: u32,
    /// (row, entry) so validation and write problems interleave in row order
    entries: Vec<(u32, BatchErrorEntry)>,
}

/// Drives ingestion runs through a shared [`VersionLedger`]
pub struct BatchOrchestrator<S: ReceiptStore + ?Sized> {
    ledger: VersionLedger<S>,
}

impl<S: ReceiptStore + ?Sized> BatchOrchestrator<S> {
    pub fn new(ledger: VersionLedger<S>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &VersionLedger<S> {
        &self.ledger
    }

    /// Ingest one file and record the run as a batch
    ///
    /// The batch is created in `processing` before any row is touched and
    /// finalized exactly once. Header, read and empty-file failures yield
    /// [`BatchResult::Aborted`]; otherwise every row is attempted and the
    /// result is [`BatchResult::Completed`] even when some rows failed.
    ///
    /// # Errors
    ///
    /// Only when the batch record itself cannot be created or finalized.
    pub fn run_ingestion<T: TabularSource + ?Sized>(
        &self,
        source: &T,
        actor: Option<&ActorRef>,
        file_name: Option<&str>,
    ) -> Result<BatchResult> {
        let file_name = file_name.unwrap_or_else(|| source.name());
        let store = self.ledger.store();

        let batch = UploadBatch::start(file_name, actor.cloned(), Utc::now());
        store.create_batch(&batch)?;

        log_op_start!("run_ingestion", batch_id = %batch.id, file_name = file_name);
        let start = Instant::now();

        let report = match ingest(source) {
            Ok(report) => report,
            Err(err) => return self.abort(&batch, err, start),
        };

        let tally = self.write_rows(&batch, &report, actor);
        let mut entries = tally.entries;
        entries.sort_by_key(|(row, _)| *row);

        let outcome = BatchOutcome {
            status: BatchStatus::from_counts(tally.inserted, tally.updated, tally.failed),
            inserted: tally.inserted,
            updated: tally.updated,
            failed: tally.failed,
            total_rows: report.summary.total_rows,
            error_log: entries.into_iter().map(|(_, entry)| entry).collect(),
        };
        let finished = self.finalize(&batch.id, &outcome)?;

        log_op_end!(
            "run_ingestion",
            duration_ms = start.elapsed().as_millis() as u64,
            batch_id = %finished.id,
            status = finished.status.as_str(),
            inserted = u64::from(finished.inserted),
            updated = u64::from(finished.updated),
            unchanged = u64::from(tally.unchanged),
            failed = u64::from(finished.failed)
        );
        Ok(BatchResult::Completed(BatchReport::from_batch(
            &finished,
            tally.unchanged,
        )))
    }

    fn abort(&self, batch: &UploadBatch, err: ExError, start: Instant) -> Result<BatchResult> {
        log_op_error!(
            "run_ingestion",
            err.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            batch_id = %batch.id
        );
        let message = error_text(&err);
        self.finalize(&batch.id, &BatchOutcome::aborted(message.clone()))?;
        Ok(BatchResult::Aborted(BatchAbort {
            success: false,
            batch_id: batch.id.clone(),
            error: message,
            error_code: err.code().to_string(),
            details: err.details().to_vec(),
        }))
    }

    /// Write the terminal outcome. If that write fails the batch is marked
    /// failed with the write error so it never stays `processing`, and the
    /// original error is returned.
    fn finalize(&self, batch_id: &str, outcome: &BatchOutcome) -> Result<UploadBatch> {
        let store = self.ledger.store();
        let err = match store.finalize_batch(batch_id, outcome, Utc::now()) {
            Ok(finished) => return Ok(finished),
            Err(err) => err,
        };

        tracing::warn!(
            batch_id = batch_id,
            err_code = err.code(),
            "batch finalize failed; marking batch failed"
        );
        if let Err(retry_err) =
            store.finalize_batch(batch_id, &BatchOutcome::aborted(error_text(&err)), Utc::now())
        {
            tracing::error!(
                batch_id = batch_id,
                err_code = retry_err.code(),
                "could not mark batch failed"
            );
        }
        Err(err)
    }

    /// Each row is its own unit of work; a failure is tallied and the loop
    /// moves on
    fn write_rows(
        &self,
        batch: &UploadBatch,
        report: &IngestionReport,
        actor: Option<&ActorRef>,
    ) -> RowTally {
        let mut tally = RowTally::default();

        for row_error in &report.errors {
            tally.entries.push((
                row_error.row,
                BatchErrorEntry::for_row(row_error.row, row_error.message.clone()),
            ));
        }
        tally.failed += report.summary.invalid_rows;

        let ctx = ChangeContext::upload(actor, &batch.id);
        for row in &report.rows {
            match self
                .ledger
                .ingest_row(&row.receipt_number, row.fields.clone(), &ctx)
            {
                Ok(RowOutcome::Inserted(_)) => tally.inserted += 1,
                Ok(RowOutcome::Updated(_)) => tally.updated += 1,
                Ok(RowOutcome::Unchanged(_)) => tally.unchanged += 1,
                Err(err) => {
                    tracing::warn!(
                        batch_id = %batch.id,
                        row = row.row,
                        receipt_number = %row.receipt_number,
                        err_code = err.code(),
                        "row failed"
                    );
                    tally.failed += 1;
                    tally.entries.push((
                        row.row,
                        BatchErrorEntry::for_receipt(row.receipt_number.clone(), error_text(&err))
                            .with_code(err.code()),
                    ));
                }
            }
        }
        tally
    }
}

/// The bare message when there is one, the full display otherwise
fn error_text(err: &ExError) -> String {
    if err.message().is_empty() {
        err.to_string()
    } else {
        err.message().to_string()
    }
}
