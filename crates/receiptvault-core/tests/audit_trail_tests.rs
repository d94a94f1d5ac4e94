//! Audit trail reads: history, field changes, point-in-time, comparison

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{Days, Utc};
use common::{dec, new_ledger, sample_fields};
use receiptvault_core::model::PaymentMode;
use receiptvault_core::{
    AuditTrail, ChangeContext, ExErrorKind, FieldUpdate, MemoryStore, TrackedField, VersionLedger,
};

fn seeded(receipt_number: &str) -> (VersionLedger<MemoryStore>, AuditTrail<MemoryStore>) {
    let ledger = new_ledger();
    ledger
        .create_initial_version(
            receipt_number,
            sample_fields("Kavya"),
            &ChangeContext::api(None, None),
        )
        .unwrap();
    let trail = AuditTrail::new(Arc::clone(ledger.store()));
    (ledger, trail)
}

#[test]
fn test_history_and_changes_are_newest_first() {
    // GIVEN two successive edits
    let (ledger, trail) = seeded("R-300");
    ledger
        .update_receipt(
            "R-300",
            FieldUpdate {
                payment_mode: Some(PaymentMode::Cheque),
                ..FieldUpdate::default()
            },
            None,
            None,
        )
        .unwrap();
    ledger
        .update_receipt(
            "R-300",
            FieldUpdate {
                student_name: Some("Kavya M".into()),
                annual_fee: Some(dec("2100")),
                ..FieldUpdate::default()
            },
            None,
            Some("parent request"),
        )
        .unwrap();

    // WHEN the trail is read
    let history = trail.version_history("R-300").unwrap();
    let changes = trail.field_changes("R-300").unwrap();

    // THEN versions and entries come newest transition first
    let numbers: Vec<u32> = history.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    let summary: Vec<(u32, TrackedField)> = changes
        .iter()
        .map(|e| (e.version_number, e.field_name))
        .collect();
    assert_eq!(
        summary,
        vec![
            (3, TrackedField::StudentName),
            (3, TrackedField::AnnualFee),
            (2, TrackedField::PaymentMode),
        ]
    );
    assert_eq!(changes[0].reason.as_deref(), Some("parent request"));
}

#[test]
fn test_version_at_returns_version_current_then() {
    // GIVEN v1, a marker instant, then v2
    let before = Utc::now() - chrono::Duration::seconds(60);
    let (ledger, trail) = seeded("R-301");
    thread::sleep(Duration::from_millis(5));
    let between = Utc::now();
    thread::sleep(Duration::from_millis(5));
    ledger
        .update_receipt(
            "R-301",
            FieldUpdate {
                class_name: Some("7A".into()),
                ..FieldUpdate::default()
            },
            None,
            None,
        )
        .unwrap();

    // THEN each instant resolves to the version in effect
    assert!(trail.version_at("R-301", before).unwrap().is_none());
    assert_eq!(
        trail
            .version_at("R-301", between)
            .unwrap()
            .unwrap()
            .version_number,
        1
    );
    assert_eq!(
        trail
            .version_at("R-301", Utc::now())
            .unwrap()
            .unwrap()
            .version_number,
        2
    );
}

#[test]
fn test_version_on_uses_end_of_day() {
    let (_ledger, trail) = seeded("R-302");
    let today = Utc::now().date_naive();

    let on_today = trail.version_on("R-302", today).unwrap();
    assert_eq!(on_today.map(|v| v.version_number), Some(1));

    let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
    assert!(trail.version_on("R-302", yesterday).unwrap().is_none());
}

#[test]
fn test_compare_versions_reports_field_differences() {
    // GIVEN three versions touching different fields
    let (ledger, trail) = seeded("R-303");
    for update in [
        FieldUpdate {
            class_name: Some("6B".into()),
            ..FieldUpdate::default()
        },
        FieldUpdate {
            uniform_fee: Some(dec("450")),
            ..FieldUpdate::default()
        },
    ] {
        ledger.update_receipt("R-303", update, None, None).unwrap();
    }

    // WHEN v1 and v3 are compared
    let diff = trail.compare_versions("R-303", 1, 3).unwrap();

    // THEN both fields appear with v1 values as old
    assert_eq!(
        diff.fields(),
        vec![TrackedField::ClassName, TrackedField::UniformFee]
    );
    let uniform = diff.get(TrackedField::UniformFee).unwrap();
    assert_eq!(uniform.old_value.to_string(), "0.00");
    assert_eq!(uniform.new_value.to_string(), "450.00");

    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["class_name"]["old"], "6A");
    assert_eq!(json["class_name"]["new"], "6B");
}

#[test]
fn test_unknown_receipt_or_version_is_not_found() {
    let (_ledger, trail) = seeded("R-304");

    let err = trail.version_history("R-404").unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);

    let err = trail.compare_versions("R-304", 1, 9).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::NotFound);
}
