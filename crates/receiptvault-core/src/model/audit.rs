use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::TrackedField;
use receiptvault_core_types::ActorRef;

/// One field-level before/after record of a version transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub receipt_id: String,
    /// The version the transition produced
    pub version_id: String,
    pub version_number: u32,
    pub field_name: TrackedField,
    /// Canonical text of the value before the change
    pub old_value: String,
    pub new_value: String,
    pub actor: Option<ActorRef>,
    pub changed_at: DateTime<Utc>,
    pub reason: Option<String>,
}
