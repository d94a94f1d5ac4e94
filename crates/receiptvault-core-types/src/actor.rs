//! Actor reference
//!
//! Every mutating call takes the acting principal explicitly. There is no
//! ambient "current user".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to whoever performed a change (typically an email or user id)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorRef(String);

impl ActorRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
