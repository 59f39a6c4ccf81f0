//! Activity aggregation
//!
//! Groups raw operations into [`Activity`] values: one semantically whole
//! occurrence each. A join, the inviter's verification of the new member and
//! the inviter's referral bonus collapse into one `NewMember` activity; a
//! flag and its resolution collapse into one `FlagMember` activity;
//! everything else maps one-to-one.
//!
//! The aggregator trusts its input to have been through replay: use
//! [`ActivityLog::aggregate_validated`] to leave out what replay skipped.
//! Correlations that do not line up are dropped with a warning, but an op
//! code or mint type this crate does not know is a schema defect and is
//! returned as an error.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use hearth_core::{
    MemberId, MintType, Operation, OperationId, OperationPayload, ProjectionError,
};
use hearth_ledger::ReplayReport;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Progress of a new member through join, verification and referral bonus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NewMemberActivity {
    Joined {
        join: Operation,
    },
    Verified {
        join: Operation,
        verify: Operation,
    },
    BonusMinted {
        join: Operation,
        verify: Operation,
        mint: Operation,
    },
}

impl NewMemberActivity {
    pub fn join(&self) -> &Operation {
        match self {
            Self::Joined { join }
            | Self::Verified { join, .. }
            | Self::BonusMinted { join, .. } => join,
        }
    }

    /// The member who joined
    pub fn member_id(&self) -> Option<&MemberId> {
        self.join().creator_id.as_ref()
    }

    /// The member named as inviter by the join, if any
    pub fn inviter_id(&self) -> Option<&MemberId> {
        self.join().target()
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, Self::Joined { .. })
    }

    pub fn operations(&self) -> Vec<&Operation> {
        match self {
            Self::Joined { join } => vec![join],
            Self::Verified { join, verify } => vec![join, verify],
            Self::BonusMinted { join, verify, mint } => vec![join, verify, mint],
        }
    }
}

/// A flag raised against a member, with its resolution once there is one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagMemberActivity {
    pub flag: Operation,
    pub resolution: Option<Operation>,
}

impl FlagMemberActivity {
    /// The flagged member
    pub fn flagged_member(&self) -> Option<&MemberId> {
        self.flag.target()
    }
}

/// One semantically whole occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    IndependentOperation(Operation),
    NewMember(NewMemberActivity),
    FlagMember(FlagMemberActivity),
}

impl Activity {
    /// Correlated operations, oldest first
    pub fn operations(&self) -> Vec<&Operation> {
        match self {
            Self::IndependentOperation(op) => vec![op],
            Self::NewMember(new_member) => new_member.operations(),
            Self::FlagMember(flag) => std::iter::once(&flag.flag)
                .chain(flag.resolution.as_ref())
                .collect(),
        }
    }

    /// The first operation of the activity
    pub fn first_operation(&self) -> &Operation {
        match self {
            Self::IndependentOperation(op) => op,
            Self::NewMember(new_member) => new_member.join(),
            Self::FlagMember(flag) => &flag.flag,
        }
    }

    /// Creation time of the newest correlated operation
    pub fn latest_timestamp(&self) -> DateTime<Utc> {
        self.operations()
            .iter()
            .map(|op| op.created_at)
            .max()
            .unwrap_or(self.first_operation().created_at)
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::IndependentOperation(_) => "INDEPENDENT_OPERATION",
            Self::NewMember(_) => "NEW_MEMBER",
            Self::FlagMember(_) => "FLAG_MEMBER",
        }
    }
}

/// Revision of an [`ActivityLog`]: change count plus a blake3 hash chain
/// over the ids of the operations that changed it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityLogVersion {
    changes: u64,
    digest: [u8; 32],
}

impl ActivityLogVersion {
    pub fn initial() -> Self {
        Self {
            changes: 0,
            digest: [0u8; 32],
        }
    }

    pub fn changes(&self) -> u64 {
        self.changes
    }

    fn advance(&self, operation_id: &OperationId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.digest);
        hasher.update(operation_id.as_bytes());
        Self {
            changes: self.changes + 1,
            digest: *hasher.finalize().as_bytes(),
        }
    }
}

impl Default for ActivityLogVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for ActivityLogVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.changes, hex::encode(&self.digest[..8]))
    }
}

/// Incrementally built list of activities
///
/// Correlation indices map a new member to its `NewMember` activity and an
/// unresolved flag operation to its `FlagMember` activity, so pushing an
/// operation never scans the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityLog {
    activities: Vec<Activity>,
    new_members: BTreeMap<MemberId, usize>,
    open_flags: BTreeMap<OperationId, usize>,
    version: ActivityLogVersion,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a whole log
    pub fn aggregate<'a, I>(operations: I) -> Result<Self, ProjectionError>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut log = Self::new();
        log.extend(operations)?;
        Ok(log)
    }

    /// Append operations, stopping at the first schema error
    pub fn extend<'a, I>(&mut self, operations: I) -> Result<(), ProjectionError>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        for op in operations {
            self.push(op)?;
        }
        Ok(())
    }

    /// Aggregate the operations replay accepted, leaving out every
    /// operation `report` lists as skipped
    pub fn aggregate_validated<'a, I>(
        operations: I,
        report: &ReplayReport,
    ) -> Result<Self, ProjectionError>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut log = Self::new();
        log.extend_validated(operations, report)?;
        Ok(log)
    }

    /// Append the batch that produced `report`, leaving out skipped operations
    pub fn extend_validated<'a, I>(
        &mut self,
        operations: I,
        report: &ReplayReport,
    ) -> Result<(), ProjectionError>
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let skipped = report.skipped_ids();
        self.extend(operations.into_iter().filter(|op| {
            let keep = !skipped.contains(&op.id);
            if !keep {
                debug!(operation_id = %op.id, "leaving out operation skipped by replay");
            }
            keep
        }))
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn version(&self) -> ActivityLogVersion {
        self.version
    }

    /// `NewMember` activities still waiting for verification, newest first
    pub fn unverified_new_members(&self) -> Vec<&Activity> {
        self.activities
            .iter()
            .rev()
            .filter(|a| matches!(a, Activity::NewMember(NewMemberActivity::Joined { .. })))
            .collect()
    }

    /// Fold one operation into the log
    pub fn push(&mut self, op: &Operation) -> Result<(), ProjectionError> {
        match &op.payload {
            OperationPayload::RequestInvite { .. } | OperationPayload::CreateMember { .. } => {
                self.push_join(op)
            }
            OperationPayload::Verify { to_uid, .. } => {
                self.push_verify(op, to_uid.as_ref());
                Ok(())
            }
            OperationPayload::Mint { mint_type, .. } => match mint_type {
                MintType::BasicIncome => {
                    self.push_independent(op);
                    Ok(())
                }
                MintType::ReferralBonus { invited_member_id } => {
                    self.push_referral_bonus(op, invited_member_id);
                    Ok(())
                }
                MintType::Unrecognized(name) => Err(ProjectionError::UnrecognizedMintType {
                    operation: op.id.clone(),
                    mint_type: name.clone(),
                }),
            },
            OperationPayload::FlagMember { .. } => {
                let index = self.activities.len();
                self.activities.push(Activity::FlagMember(FlagMemberActivity {
                    flag: op.clone(),
                    resolution: None,
                }));
                self.open_flags.insert(op.id.clone(), index);
                self.record_change(op);
                Ok(())
            }
            OperationPayload::ResolveFlagMember {
                to_uid,
                operation_to_resolve_id,
                ..
            } => {
                self.push_resolution(op, to_uid.as_ref(), operation_to_resolve_id);
                Ok(())
            }
            OperationPayload::Give { .. }
            | OperationPayload::Trust { .. }
            | OperationPayload::EditMember { .. }
            | OperationPayload::RequestVerification { .. } => {
                self.push_independent(op);
                Ok(())
            }
            // invites carry no activity of their own; the join names the inviter
            OperationPayload::Invite { .. } => Ok(()),
            OperationPayload::Unrecognized { op_code } => {
                Err(ProjectionError::UnrecognizedOperation {
                    operation: op.id.clone(),
                    op_code: op_code.clone(),
                })
            }
        }
    }

    fn record_change(&mut self, op: &Operation) {
        self.version = self.version.advance(&op.id);
    }

    fn push_independent(&mut self, op: &Operation) {
        self.activities.push(Activity::IndependentOperation(op.clone()));
        self.record_change(op);
    }

    fn push_join(&mut self, op: &Operation) -> Result<(), ProjectionError> {
        let Some(member) = op.creator_id.as_ref() else {
            return Err(ProjectionError::UnexpectedShape(format!(
                "join operation {} has no creator",
                op.id
            )));
        };
        if self.new_members.contains_key(member) {
            warn!(operation_id = %op.id, member_id = %member, "dropping second join for member");
            return Ok(());
        }

        self.new_members.insert(member.clone(), self.activities.len());
        self.activities
            .push(Activity::NewMember(NewMemberActivity::Joined { join: op.clone() }));
        self.record_change(op);
        Ok(())
    }

    /// Only the inviter's first verification joins the `NewMember` activity
    fn push_verify(&mut self, op: &Operation, target: Option<&MemberId>) {
        let index = target.and_then(|member| self.new_members.get(member)).copied();
        let upgraded = index
            .and_then(|index| self.activities.get(index))
            .and_then(|activity| match activity {
                Activity::NewMember(NewMemberActivity::Joined { join })
                    if is_inviter(join, op) =>
                {
                    Some(NewMemberActivity::Verified {
                        join: join.clone(),
                        verify: op.clone(),
                    })
                }
                _ => None,
            });

        match (index, upgraded) {
            (Some(index), Some(upgraded)) => {
                self.activities[index] = Activity::NewMember(upgraded);
                debug!(
                    operation_id = %op.id,
                    activity = index,
                    "verification joined new member activity"
                );
                self.record_change(op);
            }
            _ => self.push_independent(op),
        }
    }

    fn push_referral_bonus(&mut self, op: &Operation, invited: &MemberId) {
        let Some(index) = self.new_members.get(invited).copied() else {
            warn!(
                operation_id = %op.id,
                member_id = %invited,
                "dropping referral bonus for member with no join"
            );
            return;
        };

        let upgraded = match &self.activities[index] {
            Activity::NewMember(NewMemberActivity::Verified { join, verify })
                if is_inviter(join, op) =>
            {
                Ok(NewMemberActivity::BonusMinted {
                    join: join.clone(),
                    verify: verify.clone(),
                    mint: op.clone(),
                })
            }
            Activity::NewMember(NewMemberActivity::Verified { .. }) => {
                Err("dropping referral bonus not minted by the inviter")
            }
            Activity::NewMember(NewMemberActivity::Joined { .. }) => {
                Err("dropping referral bonus for unverified member")
            }
            _ => Err("dropping duplicate referral bonus"),
        };

        match upgraded {
            Ok(upgraded) => {
                self.activities[index] = Activity::NewMember(upgraded);
                self.record_change(op);
            }
            Err(reason) => warn!(operation_id = %op.id, member_id = %invited, "{}", reason),
        }
    }

    fn push_resolution(&mut self, op: &Operation, target: Option<&MemberId>, flag: &OperationId) {
        let matches_flag = self
            .open_flags
            .get(flag)
            .and_then(|&index| self.activities.get(index))
            .is_some_and(|activity| match activity {
                Activity::FlagMember(flag_activity) => {
                    target.is_some() && flag_activity.flagged_member() == target
                }
                _ => false,
            });
        if !matches_flag {
            warn!(
                operation_id = %op.id,
                flag = %flag,
                "dropping resolution with no matching open flag"
            );
            return;
        }

        if let Some(index) = self.open_flags.remove(flag) {
            if let Some(Activity::FlagMember(flag_activity)) = self.activities.get_mut(index) {
                flag_activity.resolution = Some(op.clone());
            }
            self.record_change(op);
        }
    }
}

/// True when `op` was created by the member the join names as inviter
fn is_inviter(join: &Operation, op: &Operation) -> bool {
    join.target().is_some() && join.target() == op.creator_id.as_ref()
}
