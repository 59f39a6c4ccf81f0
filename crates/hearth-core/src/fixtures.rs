//! Operation builders for tests and simulations
//!
//! Every builder takes an explicit id and timestamp so a test can lay out a
//! log in the order it wants. Timestamps are usually built with
//! [`at_hours`] / [`at_minutes`] relative to a fixed epoch.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::ids::{MemberId, OperationId};
use crate::operation::{MintType, Operation, OperationPayload};

/// Fixed reference instant all fixture timestamps are measured from
pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_527_811_200, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// `hours` after [`epoch`]
pub fn at_hours(hours: i64) -> DateTime<Utc> {
    epoch() + Duration::hours(hours)
}

/// `minutes` after [`epoch`]
pub fn at_minutes(minutes: i64) -> DateTime<Utc> {
    epoch() + Duration::minutes(minutes)
}

fn member(id: &str) -> MemberId {
    MemberId::from(id)
}

/// A genesis join: the id must be one of the configured genesis ops
pub fn genesis_invite(id: &str, creator: &str, username: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::RequestInvite {
            to_uid: None,
            full_name: username.to_string(),
            username: username.to_string(),
        },
    )
}

/// A join request naming `inviter`
pub fn request_invite(
    id: &str,
    creator: &str,
    inviter: &str,
    username: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::RequestInvite {
            to_uid: Some(member(inviter)),
            full_name: username.to_string(),
            username: username.to_string(),
        },
    )
}

pub fn create_member(
    id: &str,
    creator: &str,
    inviter: Option<&str>,
    username: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::CreateMember {
            full_name: username.to_string(),
            username: username.to_string(),
            request_invite_from_member_id: inviter.map(member),
        },
    )
}

pub fn trust(id: &str, creator: &str, target: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Trust {
            to_uid: Some(member(target)),
        },
    )
}

pub fn mint_basic_income(id: &str, creator: &str, amount: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Mint {
            amount: amount.to_string(),
            mint_type: MintType::BasicIncome,
        },
    )
}

pub fn mint_referral_bonus(
    id: &str,
    creator: &str,
    invited: &str,
    amount: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Mint {
            amount: amount.to_string(),
            mint_type: MintType::ReferralBonus {
                invited_member_id: member(invited),
            },
        },
    )
}

/// A transfer of `amount` to `target` with a donation of `donation` to the pool
pub fn give(
    id: &str,
    creator: &str,
    target: &str,
    amount: &str,
    donation: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Give {
            to_uid: Some(member(target)),
            amount: amount.to_string(),
            donation_to: None,
            donation_amount: donation.to_string(),
            memo: None,
        },
    )
}

pub fn verify(id: &str, creator: &str, target: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Verify {
            to_uid: Some(member(target)),
            video_url: None,
        },
    )
}

pub fn request_verification(id: &str, creator: &str, target: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::RequestVerification {
            to_uid: Some(member(target)),
        },
    )
}

pub fn edit_member(
    id: &str,
    creator: &str,
    full_name: Option<&str>,
    username: Option<&str>,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::EditMember {
            full_name: full_name.map(str::to_string),
            username: username.map(str::to_string),
        },
    )
}

pub fn flag_member(
    id: &str,
    creator: &str,
    target: &str,
    reason: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::FlagMember {
            to_uid: Some(member(target)),
            reason: reason.to_string(),
        },
    )
}

/// Resolution of the flag operation `flag_id` raised against `target`
pub fn resolve_flag(
    id: &str,
    creator: &str,
    target: &str,
    flag_id: &str,
    reason: &str,
    at: DateTime<Utc>,
) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::ResolveFlagMember {
            to_uid: Some(member(target)),
            operation_to_resolve_id: OperationId::from(flag_id),
            reason: reason.to_string(),
        },
    )
}

pub fn invite(id: &str, creator: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Invite { invite_token: None },
    )
}

pub fn unrecognized(id: &str, creator: &str, op_code: &str, at: DateTime<Utc>) -> Operation {
    Operation::new(
        id,
        Some(member(creator)),
        at,
        OperationPayload::Unrecognized {
            op_code: op_code.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_helpers() {
        assert_eq!(at_hours(1) - epoch(), Duration::hours(1));
        assert_eq!(at_minutes(90), at_hours(1) + Duration::minutes(30));
        assert!(at_hours(0) < at_minutes(1));
    }

    #[test]
    fn test_builders_set_op_codes() {
        let t = at_hours(0);
        assert_eq!(request_invite("a", "bob", "alice", "bob", t).op_code(), "REQUEST_INVITE");
        assert_eq!(
            resolve_flag("b", "alice", "bob", "f1", "ok", t).op_code(),
            "RESOLVE_FLAG_MEMBER"
        );
        assert_eq!(unrecognized("c", "alice", "WARP", t).op_code(), "WARP");
    }
}
