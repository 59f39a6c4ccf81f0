//! Error types for Hearth
//!
//! The replay engine and the projection stages follow opposite policies:
//! an [`InvalidOperation`] is reported and skipped, while a
//! [`ProjectionError`] is surfaced to the caller.

use thiserror::Error;

use crate::ids::{MemberId, OperationId};

/// Top-level error type for Hearth
#[derive(Debug, Error)]
pub enum HearthError {
    #[error("Invalid operation: {0}")]
    InvalidOperation(#[from] InvalidOperation),

    #[error("Trust graph error: {0}")]
    TrustGraph(#[from] TrustGraphError),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Reasons the replay engine skips an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidOperation {
    #[error("Operation has no creator")]
    MissingCreator,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Member already exists: {0}")]
    MemberAlreadyExists(MemberId),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid amount in {field}: {value:?}")]
    InvalidAmount { field: &'static str, value: String },

    #[error("Flag {flag} is not open on member {member}")]
    FlagNotOpen { member: MemberId, flag: OperationId },
}

/// Errors raised while walking inviter chains
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrustGraphError {
    #[error("Cycle detected in inviter chain at member {0}")]
    CycleDetected(MemberId),

    #[error("Missing member in inviter chain: {0}")]
    MissingMember(MemberId),
}

/// Errors raised while turning operations into activities and stories
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("Unrecognized op code {op_code:?} in operation {operation}")]
    UnrecognizedOperation {
        operation: OperationId,
        op_code: String,
    },

    #[error("Unrecognized mint type {mint_type:?} in operation {operation}")]
    UnrecognizedMintType {
        operation: OperationId,
        mint_type: String,
    },

    #[error("Member {member} referenced by operation {operation} not found")]
    MemberNotFound {
        member: MemberId,
        operation: OperationId,
    },

    #[error("Invalid amount {value:?} in operation {operation}")]
    InvalidAmount {
        operation: OperationId,
        value: String,
    },

    #[error("Unexpected activity shape: {0}")]
    UnexpectedShape(String),

    #[error("Story chain deeper than {max} links")]
    ChainTooDeep { max: usize },
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// Result type alias for Hearth operations
pub type HearthResult<T> = Result<T, HearthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_operation_display() {
        let err = InvalidOperation::MemberNotFound(MemberId::from("bob"));
        assert!(format!("{}", err).contains("Member not found"));
        assert!(format!("{}", err).contains("bob"));

        let err = InvalidOperation::InvalidAmount {
            field: "amount",
            value: "ten".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("amount"));
        assert!(msg.contains("ten"));

        assert!(format!("{}", InvalidOperation::MissingCreator).contains("no creator"));
    }

    #[test]
    fn test_trust_graph_error_display() {
        let err = TrustGraphError::CycleDetected(MemberId::from("carol"));
        assert!(format!("{}", err).contains("Cycle detected"));
        assert!(format!("{}", err).contains("carol"));

        let err = TrustGraphError::MissingMember(MemberId::from("dave"));
        assert!(format!("{}", err).contains("dave"));
    }

    #[test]
    fn test_projection_error_display() {
        let err = ProjectionError::UnrecognizedOperation {
            operation: OperationId::from("op-9"),
            op_code: "TELEPORT".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("TELEPORT"));
        assert!(msg.contains("op-9"));

        assert!(format!("{}", ProjectionError::ChainTooDeep { max: 4 }).contains("4"));
    }

    #[test]
    fn test_error_conversions() {
        let err: HearthError = InvalidOperation::MissingCreator.into();
        assert!(matches!(err, HearthError::InvalidOperation(_)));

        let err: HearthError = TrustGraphError::MissingMember(MemberId::from("x")).into();
        assert!(matches!(err, HearthError::TrustGraph(_)));

        let err: HearthError = ProjectionError::UnexpectedShape("x".to_string()).into();
        assert!(matches!(err, HearthError::Projection(_)));

        let err: HearthError = ConfigError::Parse("bad".to_string()).into();
        assert!(format!("{}", err).contains("Config error"));
    }
}
