//! Identifier newtypes
//!
//! Ids arrive from the log as opaque strings. Wrapping them keeps member ids
//! and operation ids from being mixed up at call sites.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifier of a ledger participant
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Wrap a raw member id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MemberId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MemberId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of an operation in the log
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(String);

impl OperationId {
    /// Wrap a raw operation id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the id as bytes (for hashing into version digests)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for OperationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OperationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_display() {
        let id = MemberId::new("alice");
        assert_eq!(format!("{}", id), "alice");
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_ids_are_ordered_by_raw_value() {
        let mut ids: Vec<MemberId> = ["carol", "alice", "bob"]
            .into_iter()
            .map(MemberId::from)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(MemberId::as_str).collect();
        assert_eq!(sorted, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_serde_transparent() {
        let id = OperationId::new("op-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"op-1\"");
        let back: OperationId = serde_json::from_str("\"op-1\"").unwrap();
        assert_eq!(back, id);
    }
}
