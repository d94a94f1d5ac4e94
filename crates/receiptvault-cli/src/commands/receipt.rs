//! Single-receipt commands: create, update, void and the audit reads

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use receiptvault_core::model::PaymentMode;
use receiptvault_core::{ChangeContext, FieldUpdate, VersionOutcome};
use rust_decimal::Decimal;
use serde_json::json;

use super::{print_json, Context};

#[derive(Debug, Args)]
pub struct ReceiptArgs {
    #[command(subcommand)]
    pub command: ReceiptCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReceiptCommand {
    /// Write version 1 of a new receipt
    Create(EditArgs),
    /// Change fields; a new version is written only if something differs
    Update(EditArgs),
    /// Mark a receipt voided
    Void(VoidArgs),
    /// Receipt with its current version
    Show(NumberArg),
    /// All versions, newest first
    History(NumberArg),
    /// All field changes, newest first
    Changes(NumberArg),
    /// The version current at an instant or at the end of a day
    At(AtArgs),
    /// Field differences between two version numbers
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct NumberArg {
    pub receipt_number: String,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub receipt_number: String,

    #[arg(long)]
    pub student_name: Option<String>,

    #[arg(long = "class")]
    pub class_name: Option<String>,

    /// Canonical name or a common label (GPay, Check, NEFT, ...)
    #[arg(long, value_parser = parse_payment_mode)]
    pub payment_mode: Option<PaymentMode>,

    /// YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub annual_fee: Option<Decimal>,

    #[arg(long)]
    pub tuition_fee: Option<Decimal>,

    #[arg(long)]
    pub kit_books_fee: Option<Decimal>,

    #[arg(long)]
    pub activity_fee: Option<Decimal>,

    #[arg(long)]
    pub uniform_fee: Option<Decimal>,

    /// Recorded on every audit entry of the change
    #[arg(long)]
    pub reason: Option<String>,
}

impl EditArgs {
    fn field_update(&self) -> FieldUpdate {
        FieldUpdate {
            student_name: self.student_name.clone(),
            class_name: self.class_name.clone(),
            payment_mode: self.payment_mode,
            date: self.date,
            annual_fee: self.annual_fee,
            tuition_fee: self.tuition_fee,
            kit_books_fee: self.kit_books_fee,
            activity_fee: self.activity_fee,
            uniform_fee: self.uniform_fee,
        }
    }
}

#[derive(Debug, Args)]
pub struct VoidArgs {
    pub receipt_number: String,

    #[arg(long)]
    pub reason: Option<String>,
}

#[derive(Debug, Args)]
pub struct AtArgs {
    pub receipt_number: String,

    /// RFC 3339 instant, e.g. 2026-02-09T10:00:00Z
    #[arg(long, conflicts_with = "on", required_unless_present = "on")]
    pub at: Option<DateTime<Utc>>,

    /// Calendar day (YYYY-MM-DD); the version current at its end
    #[arg(long)]
    pub on: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    pub receipt_number: String,
    pub from_version: u32,
    pub to_version: u32,
}

/// Lenient payment-mode parsing for command-line input
pub fn parse_payment_mode(raw: &str) -> Result<PaymentMode, String> {
    PaymentMode::from_label(raw).ok_or_else(|| format!("unknown payment mode '{}'", raw))
}

pub fn execute(args: ReceiptArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        ReceiptCommand::Create(edit) => execute_create(edit, ctx),
        ReceiptCommand::Update(edit) => execute_update(edit, ctx),
        ReceiptCommand::Void(void) => {
            let receipt =
                ctx.ledger()
                    .void_receipt(&void.receipt_number, ctx.actor(), void.reason.as_deref())?;
            print_json(&receipt)
        }
        ReceiptCommand::Show(arg) => print_json(&ctx.queries().receipt_detail(&arg.receipt_number)?),
        ReceiptCommand::History(arg) => {
            print_json(&ctx.audit().version_history(&arg.receipt_number)?)
        }
        ReceiptCommand::Changes(arg) => {
            print_json(&ctx.audit().field_changes(&arg.receipt_number)?)
        }
        ReceiptCommand::At(at) => {
            let audit = ctx.audit();
            let version = match (at.at, at.on) {
                (Some(instant), _) => audit.version_at(&at.receipt_number, instant)?,
                (None, Some(day)) => audit.version_on(&at.receipt_number, day)?,
                (None, None) => return Err("one of --at or --on is required".into()),
            };
            print_json(&version)
        }
        ReceiptCommand::Compare(cmp) => print_json(&ctx.audit().compare_versions(
            &cmp.receipt_number,
            cmp.from_version,
            cmp.to_version,
        )?),
    }
}

fn execute_create(args: EditArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let fields = args
        .field_update()
        .validated()?
        .into_initial(&args.receipt_number)?;
    let change = ChangeContext::manual_edit(ctx.actor(), args.reason.as_deref());
    let version = ctx
        .ledger()
        .create_initial_version(&args.receipt_number, fields, &change)?;
    print_json(&version)
}

fn execute_update(args: EditArgs, ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let update = args.field_update();
    if update.is_empty() {
        return Err("nothing to update: pass at least one field flag".into());
    }
    let outcome = ctx.ledger().update_receipt(
        &args.receipt_number,
        update,
        ctx.actor(),
        args.reason.as_deref(),
    )?;

    let body = match &outcome {
        VersionOutcome::Created { version, changes } => {
            json!({ "outcome": "created", "version": version, "changes": changes })
        }
        VersionOutcome::Initialized(version) => {
            json!({ "outcome": "initialized", "version": version })
        }
        VersionOutcome::Unchanged(version) => {
            json!({ "outcome": "unchanged", "version": version })
        }
    };
    print_json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_mode_accepts_labels() {
        assert_eq!(parse_payment_mode("GPay"), Ok(PaymentMode::Upi));
        assert_eq!(parse_payment_mode("bank transfer"), Ok(PaymentMode::BankTransfer));
        assert!(parse_payment_mode("barter").is_err());
    }
}
