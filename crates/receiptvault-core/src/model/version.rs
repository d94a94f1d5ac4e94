use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fields::ReceiptFields;
use receiptvault_core_types::ActorRef;

/// Where a version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    Upload,
    ManualEdit,
    Api,
}

impl VersionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::Upload => "upload",
            VersionSource::ManualEdit => "manual_edit",
            VersionSource::Api => "api",
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(VersionSource::Upload),
            "manual_edit" => Ok(VersionSource::ManualEdit),
            "api" => Ok(VersionSource::Api),
            other => Err(format!("unknown version source '{}'", other)),
        }
    }
}

/// Immutable snapshot of a receipt's tracked fields
///
/// Version numbers start at 1 and increase by one per receipt with no gaps.
/// Nothing here is ever updated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptVersion {
    pub id: String,
    pub receipt_id: String,
    pub version_number: u32,
    #[serde(flatten)]
    pub fields: ReceiptFields,
    pub source: VersionSource,
    pub batch_id: Option<String>,
    pub actor: Option<ActorRef>,
    pub created_at: DateTime<Utc>,
}

impl ReceiptVersion {
    /// Derived from the fee lines every time it is asked for
    pub fn total_amount(&self) -> Decimal {
        self.fields.total_amount()
    }
}
