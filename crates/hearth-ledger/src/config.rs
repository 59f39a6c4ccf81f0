//! Ledger configuration

use std::collections::BTreeSet;

use hearth_core::{ConfigError, OperationId};
use serde::{Deserialize, Serialize};

/// Bootstrap join operations of the production log
pub const DEFAULT_GENESIS_REQUEST_INVITE_OPS: [&str; 4] = [
    "InuYAjMISl6operovXIR",
    "SKI5CxMXWd4qjJm1zm1y",
    "SUswrxogVQ6S0rH8O2h7",
    "Y8FiyjOLs9O8AZNGzhwQ",
];

/// Bootstrap trust operations of the production log
pub const DEFAULT_GENESIS_TRUST_OPS: [&str; 4] = [
    "va9A8nQ4C4ZiAsJG2nLt",
    "CmVDdktn3c3Uo5pP4rV6",
    "uAFLhBjYtrpTXOZkJ6BD",
    "y5EKzzihWm8RlDCcfv6d",
];

/// Replay configuration
///
/// Genesis operations are exempt from the usual referential checks. Join
/// requests in `genesis_request_invite_ops` seed members with the genesis
/// sentinel as inviter; creator-less operations in `genesis_trust_ops` are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub genesis_request_invite_ops: BTreeSet<OperationId>,
    pub genesis_trust_ops: BTreeSet<OperationId>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_request_invite_ops: DEFAULT_GENESIS_REQUEST_INVITE_OPS
                .iter()
                .map(|id| OperationId::from(*id))
                .collect(),
            genesis_trust_ops: DEFAULT_GENESIS_TRUST_OPS
                .iter()
                .map(|id| OperationId::from(*id))
                .collect(),
        }
    }
}

impl LedgerConfig {
    /// Configuration with no genesis operations at all
    pub fn empty() -> Self {
        Self {
            genesis_request_invite_ops: BTreeSet::new(),
            genesis_trust_ops: BTreeSet::new(),
        }
    }

    /// Replace the genesis join operations
    pub fn with_genesis_request_invite_ops<I, T>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OperationId>,
    {
        self.genesis_request_invite_ops = ops.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the genesis trust operations
    pub fn with_genesis_trust_ops<I, T>(mut self, ops: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OperationId>,
    {
        self.genesis_trust_ops = ops.into_iter().map(Into::into).collect();
        self
    }

    /// Load from a JSON document. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn is_genesis_request_invite(&self, id: &OperationId) -> bool {
        self.genesis_request_invite_ops.contains(id)
    }

    /// Whether `id` is any kind of genesis operation
    pub fn is_genesis(&self, id: &OperationId) -> bool {
        self.genesis_request_invite_ops.contains(id) || self.genesis_trust_ops.contains(id)
    }
}
