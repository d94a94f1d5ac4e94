use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::version::ReceiptVersion;

/// Lifecycle of a receipt. `Voided` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Active,
    Voided,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Active => "active",
            ReceiptStatus::Voided => "voided",
        }
    }
}

impl fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReceiptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReceiptStatus::Active),
            "voided" => Ok(ReceiptStatus::Voided),
            other => Err(format!("unknown receipt status '{}'", other)),
        }
    }
}

/// Receipt - the aggregate root, identified by its receipt number
///
/// Holds no field values itself; those live in immutable versions and the
/// receipt only points at the latest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// UUIDv7
    pub id: String,

    /// Natural key, unique across all receipts
    pub receipt_number: String,

    pub status: ReceiptStatus,

    /// Latest version; `None` only before the first version exists
    pub current_version_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receipt {
    /// A new active receipt with no versions yet
    pub fn new(receipt_number: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            receipt_number: receipt_number.into(),
            status: ReceiptStatus::Active,
            current_version_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_voided(&self) -> bool {
        self.status == ReceiptStatus::Voided
    }
}

/// A receipt together with the version its pointer resolves to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptDetail {
    pub receipt: Receipt,
    pub current_version: Option<ReceiptVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_receipt_is_active_without_version() {
        let receipt = Receipt::new("R-100", Utc::now());
        assert_eq!(receipt.status, ReceiptStatus::Active);
        assert!(receipt.current_version_id.is_none());
        assert!(!receipt.is_voided());
        assert_eq!(receipt.id.len(), 36);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [ReceiptStatus::Active, ReceiptStatus::Voided] {
            assert_eq!(status.as_str().parse::<ReceiptStatus>(), Ok(status));
        }
    }
}
