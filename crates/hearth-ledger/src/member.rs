//! Member aggregate
//!
//! A [`Member`] is derived state: it is only ever built and changed by the
//! replay engine. Relationship sets are stored on both sides of each edge
//! (`trusts`/`trusted_by`, `verified`/`verified_by`,
//! `requested_verification_from`/`requested_for_verification_by`) and the
//! engine always updates both sides in the same step.

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use hearth_core::{MemberId, OperationId};
use serde::{Deserialize, Serialize};

/// Who brought a member into the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Inviter {
    /// Seeded by a genesis operation
    Genesis,
    /// Invited by an existing member
    Member(MemberId),
}

impl Inviter {
    /// The inviting member, or `None` for genesis
    pub fn member_id(&self) -> Option<&MemberId> {
        match self {
            Self::Genesis => None,
            Self::Member(id) => Some(id),
        }
    }
}

/// A ledger participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub(crate) member_id: MemberId,
    pub(crate) username: String,
    pub(crate) full_name: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) invited_by: Option<Inviter>,
    pub(crate) invite_confirmed: bool,
    pub(crate) balance: BigDecimal,
    pub(crate) total_minted: BigDecimal,
    pub(crate) total_donated: BigDecimal,
    pub(crate) last_minted: Option<DateTime<Utc>>,
    pub(crate) last_op_created_at: DateTime<Utc>,
    pub(crate) trusts: BTreeSet<MemberId>,
    pub(crate) trusted_by: BTreeSet<MemberId>,
    pub(crate) invited: BTreeSet<MemberId>,
    pub(crate) verified: BTreeSet<MemberId>,
    pub(crate) verified_by: BTreeSet<MemberId>,
    pub(crate) requested_verification_from: BTreeSet<MemberId>,
    pub(crate) requested_for_verification_by: BTreeSet<MemberId>,
    pub(crate) open_flags: BTreeSet<OperationId>,
}

impl Member {
    pub(crate) fn new(
        member_id: MemberId,
        username: String,
        full_name: String,
        created_at: DateTime<Utc>,
        invited_by: Option<Inviter>,
    ) -> Self {
        Self {
            member_id,
            username,
            full_name,
            created_at,
            invited_by,
            invite_confirmed: false,
            balance: BigDecimal::default(),
            total_minted: BigDecimal::default(),
            total_donated: BigDecimal::default(),
            last_minted: None,
            last_op_created_at: created_at,
            trusts: BTreeSet::new(),
            trusted_by: BTreeSet::new(),
            invited: BTreeSet::new(),
            verified: BTreeSet::new(),
            verified_by: BTreeSet::new(),
            requested_verification_from: BTreeSet::new(),
            requested_for_verification_by: BTreeSet::new(),
            open_flags: BTreeSet::new(),
        }
    }

    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `None` only for members created without naming an inviter
    pub fn invited_by(&self) -> Option<&Inviter> {
        self.invited_by.as_ref()
    }

    /// The inviting member, skipping the genesis sentinel
    pub fn inviter_id(&self) -> Option<&MemberId> {
        self.invited_by.as_ref().and_then(Inviter::member_id)
    }

    /// Set once the inviter has trusted or verified this member
    pub fn invite_confirmed(&self) -> bool {
        self.invite_confirmed
    }

    pub fn balance(&self) -> &BigDecimal {
        &self.balance
    }

    pub fn total_minted(&self) -> &BigDecimal {
        &self.total_minted
    }

    /// Donations collected from gifts this member received
    pub fn total_donated(&self) -> &BigDecimal {
        &self.total_donated
    }

    pub fn last_minted(&self) -> Option<DateTime<Utc>> {
        self.last_minted
    }

    pub fn last_op_created_at(&self) -> DateTime<Utc> {
        self.last_op_created_at
    }

    pub fn trusts(&self) -> &BTreeSet<MemberId> {
        &self.trusts
    }

    pub fn trusted_by(&self) -> &BTreeSet<MemberId> {
        &self.trusted_by
    }

    pub fn invited(&self) -> &BTreeSet<MemberId> {
        &self.invited
    }

    pub fn verified(&self) -> &BTreeSet<MemberId> {
        &self.verified
    }

    pub fn verified_by(&self) -> &BTreeSet<MemberId> {
        &self.verified_by
    }

    pub fn requested_verification_from(&self) -> &BTreeSet<MemberId> {
        &self.requested_verification_from
    }

    pub fn requested_for_verification_by(&self) -> &BTreeSet<MemberId> {
        &self.requested_for_verification_by
    }

    /// Unresolved flag operations raised against this member
    pub fn open_flags(&self) -> &BTreeSet<OperationId> {
        &self.open_flags
    }

    pub fn is_verified(&self) -> bool {
        !self.verified_by.is_empty()
    }

    pub fn is_flagged(&self) -> bool {
        !self.open_flags.is_empty()
    }
}
