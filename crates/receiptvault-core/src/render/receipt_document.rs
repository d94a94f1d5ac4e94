use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::amount_words::{amount_in_words, format_inr};
use crate::errors::{ReceiptError, Result};
use crate::model::{PaymentMode, Receipt, ReceiptStatus, ReceiptVersion, TrackedField};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeLine {
    pub field: TrackedField,
    pub label: &'static str,
    pub amount: Decimal,
}

/// Everything a renderer needs for one receipt, taken from a single version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptDocument {
    pub receipt_number: String,
    pub status: ReceiptStatus,
    pub version_number: u32,
    pub student_name: String,
    pub class_name: String,
    pub payment_mode: PaymentMode,
    pub date: NaiveDate,
    pub fee_lines: Vec<FeeLine>,
    pub total_amount: Decimal,
    pub amount_in_words: String,
}

impl ReceiptDocument {
    /// # Errors
    ///
    /// `InvalidInput` if `version` belongs to another receipt or its total
    /// is too large to spell out, `Internal` if the fee lines do not add up
    /// to the total.
    pub fn build(receipt: &Receipt, version: &ReceiptVersion) -> Result<Self> {
        if version.receipt_id != receipt.id {
            return Err(ReceiptError::InvalidField {
                field: "version".to_string(),
                reason: format!(
                    "version {} does not belong to receipt {}",
                    version.id, receipt.receipt_number
                ),
            }
            .into());
        }

        let fee_lines: Vec<FeeLine> = version
            .fields
            .fees
            .lines()
            .iter()
            .map(|(field, amount)| FeeLine {
                field: *field,
                label: field.label(),
                amount: *amount,
            })
            .collect();
        let total_too_large = || ReceiptError::InvalidField {
            field: "total_amount".to_string(),
            reason: format!("version {} total is out of range", version.id),
        };
        let total_amount = version
            .fields
            .fees
            .checked_total()
            .ok_or_else(total_too_large)?;
        let amount_in_words = amount_in_words(total_amount).ok_or_else(total_too_large)?;

        let line_sum = fee_lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.amount))
            .ok_or_else(total_too_large)?;
        if line_sum != total_amount {
            return Err(ReceiptError::InconsistentTotal {
                version_id: version.id.clone(),
            }
            .into());
        }

        Ok(Self {
            receipt_number: receipt.receipt_number.clone(),
            status: receipt.status,
            version_number: version.version_number,
            student_name: version.fields.student_name.clone(),
            class_name: version.fields.class_name.clone(),
            payment_mode: version.fields.payment_mode,
            date: version.fields.date,
            fee_lines,
            total_amount,
            amount_in_words,
        })
    }
}

/// Plain Markdown rendering; zero fee lines are left out
pub fn render_markdown(doc: &ReceiptDocument) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Fee Receipt {}\n\n", doc.receipt_number));
    if doc.status == ReceiptStatus::Voided {
        output.push_str("**VOIDED**\n\n");
    }

    output.push_str(&format!("- **Student**: {}\n", doc.student_name));
    output.push_str(&format!("- **Class**: {}\n", doc.class_name));
    output.push_str(&format!("- **Date**: {}\n", doc.date.format("%d/%m/%Y")));
    output.push_str(&format!(
        "- **Payment Mode**: {}\n",
        doc.payment_mode.display_name()
    ));
    output.push_str(&format!("- **Version**: {}\n\n", doc.version_number));

    output.push_str("| Particulars | Amount |\n|---|---:|\n");
    for line in doc.fee_lines.iter().filter(|l| !l.amount.is_zero()) {
        output.push_str(&format!("| {} | {} |\n", line.label, format_inr(line.amount)));
    }
    output.push_str(&format!(
        "| **Total** | **{}** |\n\n",
        format_inr(doc.total_amount)
    ));
    output.push_str(&format!("Amount in words: Rupees {}\n", doc.amount_in_words));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeeBreakdown, ReceiptFields, VersionSource};
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fixture() -> (Receipt, ReceiptVersion) {
        let receipt = Receipt::new("R-42", Utc::now());
        let version = ReceiptVersion {
            id: "v-1".into(),
            receipt_id: receipt.id.clone(),
            version_number: 3,
            fields: ReceiptFields {
                student_name: "Nila".into(),
                class_name: "9A".into(),
                payment_mode: PaymentMode::BankTransfer,
                date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                fees: FeeBreakdown {
                    annual_fee: dec("5000.00"),
                    kit_books_fee: dec("1234.50"),
                    ..FeeBreakdown::default()
                },
            },
            source: VersionSource::Upload,
            batch_id: None,
            actor: None,
            created_at: Utc::now(),
        };
        (receipt, version)
    }

    #[test]
    fn test_build_sums_lines_to_total() {
        let (receipt, version) = fixture();
        let doc = ReceiptDocument::build(&receipt, &version).unwrap();
        assert_eq!(doc.total_amount, dec("6234.50"));
        assert_eq!(doc.fee_lines.len(), 5);
        assert_eq!(
            doc.amount_in_words,
            "Six Thousand Two Hundred Thirty Four and Fifty Paise Only"
        );
    }

    #[test]
    fn test_build_rejects_foreign_version() {
        let (_, version) = fixture();
        let other = Receipt::new("R-43", Utc::now());
        assert!(ReceiptDocument::build(&other, &version).is_err());
    }

    #[test]
    fn test_build_rejects_overflowing_total() {
        let (receipt, mut version) = fixture();
        version.fields.fees.annual_fee = Decimal::MAX;
        version.fields.fees.tuition_fee = Decimal::MAX;
        let err = ReceiptDocument::build(&receipt, &version).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ExErrorKind::InvalidInput);
    }

    #[test]
    fn test_markdown_skips_zero_lines() {
        let (receipt, version) = fixture();
        let text = render_markdown(&ReceiptDocument::build(&receipt, &version).unwrap());
        assert!(text.contains("# Fee Receipt R-42"));
        assert!(text.contains("| Kit & Books Fee | ₹ 1,234.50 |"));
        assert!(!text.contains("Uniform Fee"));
        assert!(text.contains("**₹ 6,234.50**"));
        assert!(text.contains("Bank Transfer"));
    }
}
