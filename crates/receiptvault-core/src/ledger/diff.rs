use serde::Serialize;

use crate::model::{FieldUpdate, FieldValue, ReceiptFields, TrackedField};

/// Before/after of one tracked field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: TrackedField,
    pub old_value: FieldValue,
    pub new_value: FieldValue,
}

/// Changed fields of one transition, in tracked-field order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldDiff {
    changes: Vec<FieldChange>,
}

impl FieldDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[FieldChange] {
        &self.changes
    }

    pub fn fields(&self) -> Vec<TrackedField> {
        self.changes.iter().map(|c| c.field).collect()
    }

    pub fn get(&self, field: TrackedField) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }
}

/// JSON shape: `{"student_name": {"old": "..", "new": ".."}, ...}`
impl Serialize for FieldDiff {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        #[derive(Serialize)]
        struct Pair {
            old: String,
            new: String,
        }

        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for change in &self.changes {
            map.serialize_entry(
                change.field.as_str(),
                &Pair {
                    old: change.old_value.to_string(),
                    new: change.new_value.to_string(),
                },
            )?;
        }
        map.end()
    }
}

/// Compare the supplied fields of `update` against `current`
///
/// Unsupplied fields are skipped. Expects `update` to be normalized
/// (see [`FieldUpdate::validated`]).
pub fn diff(current: &ReceiptFields, update: &FieldUpdate) -> FieldDiff {
    let changes = TrackedField::ALL
        .iter()
        .filter_map(|field| {
            let new_value = update.value(*field)?;
            let old_value = current.value(*field);
            (old_value != new_value).then(|| FieldChange {
                field: *field,
                old_value,
                new_value,
            })
        })
        .collect();
    FieldDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeeBreakdown, PaymentMode};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn current() -> ReceiptFields {
        ReceiptFields {
            student_name: "Ravi Kumar".into(),
            class_name: "7A".into(),
            payment_mode: PaymentMode::Upi,
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            fees: FeeBreakdown {
                annual_fee: dec("100.00"),
                ..FeeBreakdown::default()
            },
        }
    }

    #[test]
    fn test_identical_full_update_is_empty() {
        let update = FieldUpdate::full(&current());
        assert!(diff(&current(), &update).is_empty());
    }

    #[test]
    fn test_fee_scale_is_not_a_change() {
        let update = FieldUpdate {
            annual_fee: Some(dec("100")),
            ..FieldUpdate::default()
        };
        assert!(diff(&current(), &update).is_empty());
    }

    #[test]
    fn test_unsupplied_fields_are_not_compared() {
        let update = FieldUpdate {
            class_name: Some("7B".into()),
            ..FieldUpdate::default()
        };
        let d = diff(&current(), &update);
        assert_eq!(d.fields(), vec![TrackedField::ClassName]);
    }

    #[test]
    fn test_changes_come_out_in_tracked_order() {
        let update = FieldUpdate {
            uniform_fee: Some(dec("40.00")),
            payment_mode: Some(PaymentMode::Cash),
            student_name: Some("Ravi K".into()),
            ..FieldUpdate::default()
        };
        let d = diff(&current(), &update);
        assert_eq!(
            d.fields(),
            vec![
                TrackedField::StudentName,
                TrackedField::PaymentMode,
                TrackedField::UniformFee
            ]
        );
        let fee = d.get(TrackedField::UniformFee).unwrap();
        assert_eq!(fee.old_value.to_string(), "0.00");
        assert_eq!(fee.new_value.to_string(), "40.00");
    }

    #[test]
    fn test_serializes_as_old_new_map() {
        let update = FieldUpdate {
            class_name: Some("8A".into()),
            ..FieldUpdate::default()
        };
        let json = serde_json::to_value(diff(&current(), &update)).unwrap();
        assert_eq!(json, serde_json::json!({"class_name": {"old": "7A", "new": "8A"}}));
    }
}
