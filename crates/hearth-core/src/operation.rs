//! Operation log records
//!
//! An [`Operation`] is one immutable entry of the append-only log. The op
//! code is the discriminant of [`OperationPayload`], so every consumer has
//! to handle every kind explicitly.
//!
//! Amounts are carried as the raw decimal strings found in the log. Parsing
//! them is the consumer's job, which lets the replay engine treat a malformed
//! amount as an invalid operation rather than a decode failure.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};

use crate::ids::{MemberId, OperationId};

/// One record of the operation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique id of this operation
    pub id: OperationId,
    /// Member that created the operation. Only bootstrap operations lack one.
    pub creator_id: Option<MemberId>,
    /// Position in the globally agreed order
    pub created_at: DateTime<Utc>,
    /// Op code and op-specific data
    #[serde(flatten)]
    pub payload: OperationPayload,
}

impl Operation {
    /// Create a new operation record
    pub fn new(
        id: impl Into<OperationId>,
        creator_id: Option<MemberId>,
        created_at: DateTime<Utc>,
        payload: OperationPayload,
    ) -> Self {
        Self {
            id: id.into(),
            creator_id,
            created_at,
            payload,
        }
    }

    /// Name of the op code (for logging and error reports)
    pub fn op_code(&self) -> &str {
        self.payload.op_code()
    }

    /// The member this operation is directed at, if any
    pub fn target(&self) -> Option<&MemberId> {
        self.payload.target()
    }
}

/// Kind of currency creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MintType {
    /// Periodic basic income claimed by a member
    BasicIncome,
    /// Bonus minted by an inviter once the member they invited is verified
    ReferralBonus { invited_member_id: MemberId },
    /// A mint type this engine does not know about, under its raw name
    #[serde(untagged)]
    Unrecognized(String),
}

impl std::fmt::Display for MintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BasicIncome => write!(f, "BASIC_INCOME"),
            Self::ReferralBonus { .. } => write!(f, "REFERRAL_BONUS"),
            Self::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Op code and data of an operation.
///
/// Encoded as `{"op_code": ..., "data": ...}`. An op code outside
/// [`KNOWN_OP_CODES`] decodes to [`OperationPayload::Unrecognized`] with its
/// data discarded, and encodes back as the bare op code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(remote = "Self")]
#[serde(tag = "op_code", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationPayload {
    /// Join request, optionally naming the member who invited the creator
    RequestInvite {
        to_uid: Option<MemberId>,
        full_name: String,
        username: String,
    },

    /// Account creation from the newer onboarding flow
    CreateMember {
        full_name: String,
        username: String,
        request_invite_from_member_id: Option<MemberId>,
    },

    /// Directed trust grant
    Trust { to_uid: Option<MemberId> },

    /// Currency creation
    Mint {
        amount: String,
        #[serde(rename = "type")]
        mint_type: MintType,
    },

    /// Peer transfer with an embedded donation split
    Give {
        to_uid: Option<MemberId>,
        amount: String,
        donation_to: Option<MemberId>,
        donation_amount: String,
        memo: Option<String>,
    },

    /// Identity attestation
    Verify {
        to_uid: Option<MemberId>,
        video_url: Option<String>,
    },

    /// Request for another member to verify the creator
    RequestVerification { to_uid: Option<MemberId> },

    /// Profile edit
    EditMember {
        full_name: Option<String>,
        username: Option<String>,
    },

    /// Moderation flag raised against a member
    FlagMember {
        to_uid: Option<MemberId>,
        reason: String,
    },

    /// Resolution of an earlier flag
    ResolveFlagMember {
        to_uid: Option<MemberId>,
        operation_to_resolve_id: OperationId,
        reason: String,
    },

    /// Invitation handed out by a member. Carries no ledger state.
    Invite { invite_token: Option<String> },

    /// An op code this engine does not know about
    #[serde(skip)]
    Unrecognized { op_code: String },
}

/// Op codes with a payload shape of their own
pub const KNOWN_OP_CODES: [&str; 11] = [
    "REQUEST_INVITE",
    "CREATE_MEMBER",
    "TRUST",
    "MINT",
    "GIVE",
    "VERIFY",
    "REQUEST_VERIFICATION",
    "EDIT_MEMBER",
    "FLAG_MEMBER",
    "RESOLVE_FLAG_MEMBER",
    "INVITE",
];

/// The op code and undecoded data of a payload
#[derive(Deserialize)]
struct RawPayload {
    op_code: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Serialize for OperationPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Unrecognized { op_code } => {
                let mut record = serializer.serialize_struct("OperationPayload", 1)?;
                record.serialize_field("op_code", op_code)?;
                record.end()
            }
            known => Self::serialize(known, serializer),
        }
    }
}

impl<'de> Deserialize<'de> for OperationPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let RawPayload { op_code, data } = RawPayload::deserialize(deserializer)?;
        if !KNOWN_OP_CODES.contains(&op_code.as_str()) {
            return Ok(Self::Unrecognized { op_code });
        }
        let tagged = serde_json::json!({ "op_code": op_code, "data": data });
        Self::deserialize(tagged).map_err(de::Error::custom)
    }
}

impl OperationPayload {
    /// Name of the op code
    pub fn op_code(&self) -> &str {
        match self {
            Self::RequestInvite { .. } => "REQUEST_INVITE",
            Self::CreateMember { .. } => "CREATE_MEMBER",
            Self::Trust { .. } => "TRUST",
            Self::Mint { .. } => "MINT",
            Self::Give { .. } => "GIVE",
            Self::Verify { .. } => "VERIFY",
            Self::RequestVerification { .. } => "REQUEST_VERIFICATION",
            Self::EditMember { .. } => "EDIT_MEMBER",
            Self::FlagMember { .. } => "FLAG_MEMBER",
            Self::ResolveFlagMember { .. } => "RESOLVE_FLAG_MEMBER",
            Self::Invite { .. } => "INVITE",
            Self::Unrecognized { op_code } => op_code.as_str(),
        }
    }

    /// The member this payload is directed at, if any
    pub fn target(&self) -> Option<&MemberId> {
        match self {
            Self::RequestInvite { to_uid, .. }
            | Self::Trust { to_uid }
            | Self::Give { to_uid, .. }
            | Self::Verify { to_uid, .. }
            | Self::RequestVerification { to_uid }
            | Self::FlagMember { to_uid, .. }
            | Self::ResolveFlagMember { to_uid, .. } => to_uid.as_ref(),
            Self::CreateMember {
                request_invite_from_member_id,
                ..
            } => request_invite_from_member_id.as_ref(),
            Self::Mint {
                mint_type: MintType::ReferralBonus { invited_member_id },
                ..
            } => Some(invited_member_id),
            Self::Mint { .. }
            | Self::EditMember { .. }
            | Self::Invite { .. }
            | Self::Unrecognized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2018, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_op_code_names() {
        let op = Operation::new(
            "op-1",
            Some(MemberId::from("alice")),
            at(),
            OperationPayload::Trust {
                to_uid: Some(MemberId::from("bob")),
            },
        );
        assert_eq!(op.op_code(), "TRUST");

        let unknown = OperationPayload::Unrecognized {
            op_code: "LEGACY_THING".to_string(),
        };
        assert_eq!(unknown.op_code(), "LEGACY_THING");
    }

    #[test]
    fn test_target() {
        let give = OperationPayload::Give {
            to_uid: Some(MemberId::from("bob")),
            amount: "5".to_string(),
            donation_to: None,
            donation_amount: "0.15".to_string(),
            memo: None,
        };
        assert_eq!(give.target(), Some(&MemberId::from("bob")));

        let bonus = OperationPayload::Mint {
            amount: "60".to_string(),
            mint_type: MintType::ReferralBonus {
                invited_member_id: MemberId::from("carol"),
            },
        };
        assert_eq!(bonus.target(), Some(&MemberId::from("carol")));

        let basic = OperationPayload::Mint {
            amount: "10".to_string(),
            mint_type: MintType::BasicIncome,
        };
        assert_eq!(basic.target(), None);
    }

    #[test]
    fn test_json_shape_uses_op_code_and_data() {
        let op = Operation::new(
            "op-7",
            Some(MemberId::from("alice")),
            at(),
            OperationPayload::Mint {
                amount: "10".to_string(),
                mint_type: MintType::BasicIncome,
            },
        );
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["op_code"], "MINT");
        assert_eq!(json["data"]["amount"], "10");
        assert_eq!(json["data"]["type"], "BASIC_INCOME");
    }

    #[test]
    fn test_unknown_op_code_keeps_its_name() {
        let json = r#"{
            "id": "op-8",
            "creator_id": "alice",
            "created_at": "2018-06-01T12:00:00Z",
            "op_code": "SET_AVATAR",
            "data": {"uri": "https://avatars.test/alice.png"}
        }"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        assert_eq!(
            op.payload,
            OperationPayload::Unrecognized {
                op_code: "SET_AVATAR".to_string()
            }
        );
        assert_eq!(op.op_code(), "SET_AVATAR");

        let encoded = serde_json::to_value(&op).unwrap();
        assert_eq!(encoded["op_code"], "SET_AVATAR");
        let back: Operation = serde_json::from_value(encoded).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn test_known_op_code_with_bad_data_is_an_error() {
        let json = r#"{
            "id": "op-9",
            "creator_id": "alice",
            "created_at": "2018-06-01T12:00:00Z",
            "op_code": "TRUST",
            "data": {"to_uid": 7}
        }"#;
        assert!(serde_json::from_str::<Operation>(json).is_err());
    }

    #[test]
    fn test_known_op_codes_cover_every_payload() {
        let trust = OperationPayload::Trust {
            to_uid: Some(MemberId::from("bob")),
        };
        let encoded = serde_json::to_value(&trust).unwrap();
        assert!(KNOWN_OP_CODES.contains(&encoded["op_code"].as_str().unwrap()));
        let back: OperationPayload = serde_json::from_value(encoded).unwrap();
        assert_eq!(back, trust);
    }

    #[test]
    fn test_unknown_mint_type_keeps_its_name() {
        let mint: MintType = serde_json::from_str(r#""STAKING""#).unwrap();
        assert_eq!(mint, MintType::Unrecognized("STAKING".to_string()));
        assert_eq!(serde_json::to_string(&mint).unwrap(), r#""STAKING""#);

        let basic: MintType = serde_json::from_str(r#""BASIC_INCOME""#).unwrap();
        assert_eq!(basic, MintType::BasicIncome);
    }

    #[test]
    fn test_mint_type_display() {
        assert_eq!(MintType::BasicIncome.to_string(), "BASIC_INCOME");
        assert_eq!(
            MintType::Unrecognized("STAKING".to_string()).to_string(),
            "STAKING"
        );
    }
}
