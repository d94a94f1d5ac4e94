#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{data_row, grid_source, new_ledger, sample_fields, HEADER};
use receiptvault_core::errors::ReceiptError;
use receiptvault_core::logging_facility::test_capture::init_test_capture;
use receiptvault_core::{log_op_end, log_op_error, log_op_start};
use receiptvault_core::{BatchOrchestrator, ChangeContext, FieldUpdate};
use receiptvault_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, receipt_number = "R-LOG-1");

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[0].field("receipt_number"), Some("R-LOG-1"));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = ReceiptError::AlreadyVoided {
        receipt_number: "R-LOG-3".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[0].field("err_kind"), Some("VoidedAggregate"));
    assert_eq!(events[0].field("err_code"), Some("ERR_VOIDED_AGGREGATE"));
}

#[test]
fn test_update_receipt_logs_start_and_end() {
    // GIVEN a receipt
    let capture = init_test_capture();
    let ledger = new_ledger();
    ledger
        .create_initial_version("R-LOG-4", sample_fields("Lata"), &ChangeContext::api(None, None))
        .unwrap();

    // WHEN it is edited
    let update = FieldUpdate {
        class_name: Some("9A".into()),
        ..FieldUpdate::default()
    };
    ledger.update_receipt("R-LOG-4", update, None, None).unwrap();

    // THEN a start and an end event carry its receipt number
    let events: Vec<_> = capture
        .events_for_op("update_receipt")
        .into_iter()
        .filter(|e| e.field("receipt_number") == Some("R-LOG-4"))
        .collect();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].field("changed_fields"), Some("1"));
}

#[test]
fn test_failed_update_logs_end_error() {
    let capture = init_test_capture();
    let ledger = new_ledger();

    let _ = ledger.update_receipt("R-LOG-5", FieldUpdate::default(), None, None);

    let errors = capture.count_events(|e| {
        e.op.as_deref() == Some("update_receipt")
            && e.event.as_deref() == Some(EVENT_END_ERROR)
            && e.field("receipt_number") == Some("R-LOG-5")
    });
    assert_eq!(errors, 1);
}

#[test]
fn test_ingestion_run_logs_batch_end() {
    let capture = init_test_capture();
    let orchestrator = BatchOrchestrator::new(new_ledger());
    let rows = vec![data_row("R-LOG-6", "Mira", "Cash", "09/02/2026")];

    let result = orchestrator
        .run_ingestion(&grid_source("log-6.xlsx", &HEADER, &rows), None, None)
        .unwrap();

    let batch_id = result.batch_id().to_string();
    let end = capture.count_events(|e| {
        e.op.as_deref() == Some("run_ingestion")
            && e.event.as_deref() == Some(EVENT_END)
            && e.field("batch_id") == Some(batch_id.as_str())
    });
    assert_eq!(end, 1);
}
