//! CLI integration tests
//!
//! Drive the `receiptvault` binary against a database in a temp directory
//! and check the JSON it prints.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const HEADER: [&str; 10] = [
    "Receipt No",
    "Student Name",
    "Class",
    "Payment Mode",
    "Date",
    "Annual Fee",
    "Tuition Fee",
    "Kit Books Fee",
    "Activity Fee",
    "Uniform Fee",
];

fn write_workbook(path: &Path, rows: &[&[&str]]) {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet
                .get_cell_mut(((c + 1) as u32, (r + 1) as u32))
                .set_value(*value);
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
}

fn receiptvault(dir: &TempDir, db: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_receiptvault"))
        .current_dir(dir.path())
        .env_remove("RECEIPTVAULT_DB")
        .env("RECEIPTVAULT__LOG_PROFILE", "test")
        .arg("--db")
        .arg(db)
        .arg("--actor")
        .arg("office@school.example")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "CLI command should succeed. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn setup() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("receipts.db");
    (dir, db)
}

#[test]
fn test_upload_then_edit_and_audit() {
    // GIVEN a workbook with two good rows and one bad row
    let (dir, db) = setup();
    let workbook = dir.path().join("feb.xlsx");
    write_workbook(
        &workbook,
        &[
            &HEADER,
            &["R-1", "Asha", "6A", "Cash", "09/02/2026", "2000", "₹4,500", "750.25", "300", ""],
            &["R-2", "Ben", "7B", "GPay", "2026-02-10", "2000", "4500", "", "", ""],
            &["R-3", "", "7B", "Cash", "2026-02-10", "2000", "4500", "", "", ""],
        ],
    );

    // WHEN it is uploaded
    let output = receiptvault(&dir, &db, &["upload", workbook.to_str().unwrap()]);

    // THEN the batch is partial with one logged failure
    let report = json_stdout(&output);
    assert_eq!(report["success"], true);
    assert_eq!(report["status"], "partial");
    assert_eq!(report["inserted"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["errors"][0]["message"], "Row 4: Missing student_name");
    assert_eq!(report["errors"][0]["code"], "ERR_ROW_VALIDATION");

    // WHEN R-1's tuition fee is corrected
    let output = receiptvault(
        &dir,
        &db,
        &[
            "receipt",
            "update",
            "R-1",
            "--tuition-fee",
            "4800",
            "--reason",
            "fee revision",
        ],
    );

    // THEN version 2 records exactly that change
    let updated = json_stdout(&output);
    assert_eq!(updated["outcome"], "created");
    assert_eq!(updated["version"]["version_number"], 2);
    assert_eq!(updated["changes"]["tuition_fee"]["old"], "4500.00");
    assert_eq!(updated["changes"]["tuition_fee"]["new"], "4800.00");

    // AND the audit trail lists it with the reason
    let changes = json_stdout(&receiptvault(&dir, &db, &["receipt", "changes", "R-1"]));
    let changes = changes.as_array().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0]["field_name"], "tuition_fee");
    assert_eq!(changes[0]["reason"], "fee revision");

    let history = json_stdout(&receiptvault(&dir, &db, &["receipt", "history", "R-1"]));
    assert_eq!(history.as_array().unwrap().len(), 2);

    let diff = json_stdout(&receiptvault(
        &dir,
        &db,
        &["receipt", "compare", "R-1", "1", "2"],
    ));
    assert_eq!(diff["tuition_fee"]["new"], "4800.00");
}

#[test]
fn test_missing_headers_exit_nonzero_with_report() {
    // GIVEN a workbook without the Payment Mode column
    let (dir, db) = setup();
    let workbook = dir.path().join("bad.xlsx");
    write_workbook(
        &workbook,
        &[
            &["Receipt No", "Student Name", "Class", "Date"],
            &["R-1", "Asha", "6A", "09/02/2026"],
        ],
    );

    // WHEN it is uploaded
    let output = receiptvault(&dir, &db, &["upload", workbook.to_str().unwrap()]);

    // THEN the command fails and the abort is still printed
    assert!(!output.status.success());
    let abort: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(abort["success"], false);
    assert_eq!(abort["error_code"], "ERR_HEADER_VALIDATION");
    assert_eq!(abort["details"][0], "payment_mode");

    // AND the failed batch is listed
    let batches = json_stdout(&receiptvault(&dir, &db, &["batch", "list"]));
    assert_eq!(batches["total_count"], 1);
    assert_eq!(batches["items"][0]["status"], "failed");
}

#[test]
fn test_create_void_search_and_render() {
    // GIVEN a receipt created by hand
    let (dir, db) = setup();
    let created = json_stdout(&receiptvault(
        &dir,
        &db,
        &[
            "receipt",
            "create",
            "R-10",
            "--student-name",
            "Chitra",
            "--class",
            "8C",
            "--payment-mode",
            "NEFT",
            "--date",
            "2026-03-01",
            "--annual-fee",
            "1500",
            "--tuition-fee",
            "2500.5",
        ],
    ));
    assert_eq!(created["version_number"], 1);
    assert_eq!(created["payment_mode"], "bank_transfer");

    // WHEN it is rendered
    let output = receiptvault(&dir, &db, &["render", "R-10"]);

    // THEN the document shows the total in words
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("# Fee Receipt R-10"));
    assert!(text.contains("Four Thousand"));

    // WHEN it is voided
    let voided = json_stdout(&receiptvault(
        &dir,
        &db,
        &["receipt", "void", "R-10", "--reason", "issued twice"],
    ));
    assert_eq!(voided["status"], "voided");

    // THEN a status search finds it and further edits are refused
    let found = json_stdout(&receiptvault(
        &dir,
        &db,
        &["search", "--status", "voided", "--query", "chit"],
    ));
    assert_eq!(found["total_count"], 1);
    assert_eq!(found["items"][0]["receipt"]["receipt_number"], "R-10");

    let output = receiptvault(
        &dir,
        &db,
        &["receipt", "update", "R-10", "--class", "8D"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_VOIDED_AGGREGATE"));
}

#[test]
fn test_unknown_receipt_fails() {
    let (dir, db) = setup();
    let output = receiptvault(&dir, &db, &["receipt", "show", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_FOUND"));
}
