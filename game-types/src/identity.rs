use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Caller identity as resolved by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub source: IdentitySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    Authenticated, // verified bearer token
    Fallback,      // caller-supplied userId, e.g. voice assistant requests
}

impl Identity {
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: IdentitySource::Authenticated,
        }
    }

    pub fn fallback(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: IdentitySource::Fallback,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.source == IdentitySource::Authenticated
    }
}
