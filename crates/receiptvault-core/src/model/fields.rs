//! Tracked receipt fields
//!
//! The tracked field set is fixed. Diffing, auditing and carry-forward all
//! walk [`TrackedField::ALL`], so its order is the order audit entries for a
//! single transition are written and read back in.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::payment_mode::PaymentMode;
use crate::errors::ReceiptError;

/// A field whose changes are versioned and audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    StudentName,
    ClassName,
    PaymentMode,
    Date,
    AnnualFee,
    TuitionFee,
    KitBooksFee,
    ActivityFee,
    UniformFee,
}

impl TrackedField {
    pub const ALL: [TrackedField; 9] = [
        TrackedField::StudentName,
        TrackedField::ClassName,
        TrackedField::PaymentMode,
        TrackedField::Date,
        TrackedField::AnnualFee,
        TrackedField::TuitionFee,
        TrackedField::KitBooksFee,
        TrackedField::ActivityFee,
        TrackedField::UniformFee,
    ];

    pub const FEES: [TrackedField; 5] = [
        TrackedField::AnnualFee,
        TrackedField::TuitionFee,
        TrackedField::KitBooksFee,
        TrackedField::ActivityFee,
        TrackedField::UniformFee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::StudentName => "student_name",
            TrackedField::ClassName => "class_name",
            TrackedField::PaymentMode => "payment_mode",
            TrackedField::Date => "date",
            TrackedField::AnnualFee => "annual_fee",
            TrackedField::TuitionFee => "tuition_fee",
            TrackedField::KitBooksFee => "kit_books_fee",
            TrackedField::ActivityFee => "activity_fee",
            TrackedField::UniformFee => "uniform_fee",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().find(|f| f.as_str() == name).copied()
    }

    pub fn is_fee(&self) -> bool {
        Self::FEES.contains(self)
    }

    /// Label printed next to a fee line
    pub fn label(&self) -> &'static str {
        match self {
            TrackedField::StudentName => "Student Name",
            TrackedField::ClassName => "Class",
            TrackedField::PaymentMode => "Payment Mode",
            TrackedField::Date => "Date",
            TrackedField::AnnualFee => "Annual Fee",
            TrackedField::TuitionFee => "Tuition Fee",
            TrackedField::KitBooksFee => "Kit & Books Fee",
            TrackedField::ActivityFee => "Activity Fee",
            TrackedField::UniformFee => "Uniform Fee",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized value of one tracked field
///
/// Equality is the change test used by the ledger: amounts compare
/// numerically, dates by calendar day, text exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Mode(PaymentMode),
    Date(NaiveDate),
    Amount(Decimal),
}

impl fmt::Display for FieldValue {
    /// Canonical text form stored in audit entries
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Mode(m) => f.write_str(m.as_str()),
            FieldValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            FieldValue::Amount(a) => write!(f, "{}", money::normalize(*a)),
        }
    }
}

/// The five fee components of a version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub annual_fee: Decimal,
    pub tuition_fee: Decimal,
    pub kit_books_fee: Decimal,
    pub activity_fee: Decimal,
    pub uniform_fee: Decimal,
}

impl Default for FeeBreakdown {
    fn default() -> Self {
        Self {
            annual_fee: money::zero(),
            tuition_fee: money::zero(),
            kit_books_fee: money::zero(),
            activity_fee: money::zero(),
            uniform_fee: money::zero(),
        }
    }
}

impl FeeBreakdown {
    pub fn get(&self, field: TrackedField) -> Option<Decimal> {
        match field {
            TrackedField::AnnualFee => Some(self.annual_fee),
            TrackedField::TuitionFee => Some(self.tuition_fee),
            TrackedField::KitBooksFee => Some(self.kit_books_fee),
            TrackedField::ActivityFee => Some(self.activity_fee),
            TrackedField::UniformFee => Some(self.uniform_fee),
            _ => None,
        }
    }

    fn slot_mut(&mut self, field: TrackedField) -> Option<&mut Decimal> {
        match field {
            TrackedField::AnnualFee => Some(&mut self.annual_fee),
            TrackedField::TuitionFee => Some(&mut self.tuition_fee),
            TrackedField::KitBooksFee => Some(&mut self.kit_books_fee),
            TrackedField::ActivityFee => Some(&mut self.activity_fee),
            TrackedField::UniformFee => Some(&mut self.uniform_fee),
            _ => None,
        }
    }

    /// Fee lines in tracked-field order
    pub fn lines(&self) -> [(TrackedField, Decimal); 5] {
        [
            (TrackedField::AnnualFee, self.annual_fee),
            (TrackedField::TuitionFee, self.tuition_fee),
            (TrackedField::KitBooksFee, self.kit_books_fee),
            (TrackedField::ActivityFee, self.activity_fee),
            (TrackedField::UniformFee, self.uniform_fee),
        ]
    }

    /// Sum of the five components. Never stored.
    ///
    /// Saturates at `Decimal::MAX`; components within
    /// [`money::max_amount`] never get there.
    pub fn total(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::MAX)
    }

    /// Sum of the five components, `None` on overflow
    pub fn checked_total(&self) -> Option<Decimal> {
        self.lines()
            .iter()
            .try_fold(Decimal::ZERO, |sum, (_, amount)| sum.checked_add(*amount))
            .map(money::normalize)
    }

    pub fn normalized(mut self) -> Self {
        for field in TrackedField::FEES {
            if let Some(slot) = self.slot_mut(field) {
                *slot = money::normalize(*slot);
            }
        }
        self
    }
}

/// Complete snapshot of the tracked fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFields {
    pub student_name: String,
    pub class_name: String,
    pub payment_mode: PaymentMode,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub fees: FeeBreakdown,
}

impl ReceiptFields {
    pub fn value(&self, field: TrackedField) -> FieldValue {
        match field {
            TrackedField::StudentName => FieldValue::Text(self.student_name.clone()),
            TrackedField::ClassName => FieldValue::Text(self.class_name.clone()),
            TrackedField::PaymentMode => FieldValue::Mode(self.payment_mode),
            TrackedField::Date => FieldValue::Date(self.date),
            fee => FieldValue::Amount(self.fees.get(fee).unwrap_or_else(money::zero)),
        }
    }

    pub fn total_amount(&self) -> Decimal {
        self.fees.total()
    }

    /// Trimmed names and two-place fees
    pub fn normalized(self) -> Self {
        Self {
            student_name: self.student_name.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
            payment_mode: self.payment_mode,
            date: self.date,
            fees: self.fees.normalized(),
        }
    }
}

/// Partial update of the tracked fields
///
/// `None` means "not supplied": the field is neither compared nor changed
/// and the current value is carried into the next version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuition_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kit_books_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniform_fee: Option<Decimal>,
}

impl FieldUpdate {
    /// An update that supplies every field
    pub fn full(fields: &ReceiptFields) -> Self {
        Self {
            student_name: Some(fields.student_name.clone()),
            class_name: Some(fields.class_name.clone()),
            payment_mode: Some(fields.payment_mode),
            date: Some(fields.date),
            annual_fee: Some(fields.fees.annual_fee),
            tuition_fee: Some(fields.fees.tuition_fee),
            kit_books_fee: Some(fields.fees.kit_books_fee),
            activity_fee: Some(fields.fees.activity_fee),
            uniform_fee: Some(fields.fees.uniform_fee),
        }
    }

    fn fee(&self, field: TrackedField) -> Option<Decimal> {
        match field {
            TrackedField::AnnualFee => self.annual_fee,
            TrackedField::TuitionFee => self.tuition_fee,
            TrackedField::KitBooksFee => self.kit_books_fee,
            TrackedField::ActivityFee => self.activity_fee,
            TrackedField::UniformFee => self.uniform_fee,
            _ => None,
        }
    }

    pub fn value(&self, field: TrackedField) -> Option<FieldValue> {
        match field {
            TrackedField::StudentName => self.student_name.clone().map(FieldValue::Text),
            TrackedField::ClassName => self.class_name.clone().map(FieldValue::Text),
            TrackedField::PaymentMode => self.payment_mode.map(FieldValue::Mode),
            TrackedField::Date => self.date.map(FieldValue::Date),
            fee => self.fee(fee).map(FieldValue::Amount),
        }
    }

    pub fn supplied_fields(&self) -> Vec<TrackedField> {
        TrackedField::ALL
            .iter()
            .copied()
            .filter(|f| self.value(*f).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.supplied_fields().is_empty()
    }

    /// Trim text, require it non-empty, reject negative or out-of-range fees
    /// and fix fee scale
    ///
    /// # Errors
    ///
    /// `InvalidField` naming the first offending field.
    pub fn validated(self) -> Result<Self, ReceiptError> {
        fn text(field: TrackedField, value: Option<String>) -> Result<Option<String>, ReceiptError> {
            match value {
                None => Ok(None),
                Some(v) => {
                    let trimmed = v.trim();
                    if trimmed.is_empty() {
                        Err(ReceiptError::InvalidField {
                            field: field.as_str().to_string(),
                            reason: "must not be blank".to_string(),
                        })
                    } else {
                        Ok(Some(trimmed.to_string()))
                    }
                }
            }
        }

        fn amount(field: TrackedField, value: Option<Decimal>) -> Result<Option<Decimal>, ReceiptError> {
            match value {
                Some(v) if v.is_sign_negative() && !v.is_zero() => Err(ReceiptError::InvalidField {
                    field: field.as_str().to_string(),
                    reason: format!("must not be negative (got {})", v),
                }),
                Some(v) => money::checked_normalize(v).map(Some).ok_or_else(|| {
                    ReceiptError::InvalidField {
                        field: field.as_str().to_string(),
                        reason: format!("must not exceed {} (got {})", money::max_amount(), v),
                    }
                }),
                None => Ok(None),
            }
        }

        Ok(Self {
            student_name: text(TrackedField::StudentName, self.student_name)?,
            class_name: text(TrackedField::ClassName, self.class_name)?,
            payment_mode: self.payment_mode,
            date: self.date,
            annual_fee: amount(TrackedField::AnnualFee, self.annual_fee)?,
            tuition_fee: amount(TrackedField::TuitionFee, self.tuition_fee)?,
            kit_books_fee: amount(TrackedField::KitBooksFee, self.kit_books_fee)?,
            activity_fee: amount(TrackedField::ActivityFee, self.activity_fee)?,
            uniform_fee: amount(TrackedField::UniformFee, self.uniform_fee)?,
        })
    }

    /// Overlay this update on `base`; unsupplied fields carry forward
    pub fn apply_to(&self, base: &ReceiptFields) -> ReceiptFields {
        let mut fees = base.fees.clone();
        for field in TrackedField::FEES {
            if let (Some(value), Some(slot)) = (self.fee(field), fees.slot_mut(field)) {
                *slot = value;
            }
        }
        ReceiptFields {
            student_name: self
                .student_name
                .clone()
                .unwrap_or_else(|| base.student_name.clone()),
            class_name: self
                .class_name
                .clone()
                .unwrap_or_else(|| base.class_name.clone()),
            payment_mode: self.payment_mode.unwrap_or(base.payment_mode),
            date: self.date.unwrap_or(base.date),
            fees,
        }
        .normalized()
    }

    /// Build a first snapshot when there is nothing to carry forward
    ///
    /// Unsupplied fees default to `0.00`; the four descriptive fields are
    /// required.
    ///
    /// # Errors
    ///
    /// `IncompleteInitialData` listing the missing descriptive fields.
    pub fn into_initial(self, receipt_number: &str) -> Result<ReceiptFields, ReceiptError> {
        let mut missing = Vec::new();
        if self.student_name.is_none() {
            missing.push(TrackedField::StudentName.as_str().to_string());
        }
        if self.class_name.is_none() {
            missing.push(TrackedField::ClassName.as_str().to_string());
        }
        if self.payment_mode.is_none() {
            missing.push(TrackedField::PaymentMode.as_str().to_string());
        }
        if self.date.is_none() {
            missing.push(TrackedField::Date.as_str().to_string());
        }

        match (self.student_name, self.class_name, self.payment_mode, self.date) {
            (Some(student_name), Some(class_name), Some(payment_mode), Some(date)) => {
                Ok(ReceiptFields {
                    student_name,
                    class_name,
                    payment_mode,
                    date,
                    fees: FeeBreakdown {
                        annual_fee: self.annual_fee.unwrap_or_else(money::zero),
                        tuition_fee: self.tuition_fee.unwrap_or_else(money::zero),
                        kit_books_fee: self.kit_books_fee.unwrap_or_else(money::zero),
                        activity_fee: self.activity_fee.unwrap_or_else(money::zero),
                        uniform_fee: self.uniform_fee.unwrap_or_else(money::zero),
                    },
                }
                .normalized())
            }
            _ => Err(ReceiptError::IncompleteInitialData {
                receipt_number: receipt_number.to_string(),
                missing,
            }),
        }
    }
}
