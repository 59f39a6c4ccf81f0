//! Ledger replay engine
//!
//! Folds an ordered operation log into a [`MemberDirectory`]. Each step is
//! validate-then-commit: [`ReplayEngine::apply`] checks everything an
//! operation references before touching the directory, so a rejected
//! operation leaves no trace. The batch drivers log rejected operations and
//! keep going.
//!
//! Full rebuild and incremental append agree:
//! `replay(a ++ b) == extend(replay(a), b)`.

use std::collections::BTreeSet;

use bigdecimal::BigDecimal;
use hearth_core::{
    parse_amount, InvalidOperation, MemberId, Operation, OperationId, OperationPayload,
};
use tracing::{debug, trace, warn};

use crate::config::LedgerConfig;
use crate::directory::MemberDirectory;
use crate::member::{Inviter, Member};

/// Result of a successful replay step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The directory changed and its version advanced
    Applied,
    /// The operation carries no ledger state
    Ignored,
}

/// An operation the engine refused, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    pub operation_id: OperationId,
    pub reason: InvalidOperation,
}

/// Summary of one replay batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub ignored: usize,
    pub skipped: Vec<SkippedOperation>,
}

impl ReplayReport {
    /// True if no operation was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Total operations seen
    pub fn total(&self) -> usize {
        self.applied + self.ignored + self.skipped.len()
    }

    pub fn was_skipped(&self, id: &OperationId) -> bool {
        self.skipped.iter().any(|skip| &skip.operation_id == id)
    }

    /// Ids of the skipped operations
    pub fn skipped_ids(&self) -> BTreeSet<&OperationId> {
        self.skipped.iter().map(|skip| &skip.operation_id).collect()
    }

    /// Fold a later batch into this report
    pub fn merge(&mut self, later: ReplayReport) {
        self.applied += later.applied;
        self.ignored += later.ignored;
        self.skipped.extend(later.skipped);
    }
}

/// Replays operations onto member directories
#[derive(Debug, Clone, Default)]
pub struct ReplayEngine {
    config: LedgerConfig,
}

impl ReplayEngine {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Full rebuild: fold every operation onto an empty directory
    pub fn replay<'a, I>(&self, operations: I) -> MemberDirectory
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        self.replay_with_report(operations).0
    }

    /// Full rebuild, also returning what was applied and skipped
    pub fn replay_with_report<'a, I>(&self, operations: I) -> (MemberDirectory, ReplayReport)
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut directory = MemberDirectory::new();
        let report = self.extend_with_report(&mut directory, operations);
        (directory, report)
    }

    /// Incremental append onto a previously replayed directory
    pub fn extend<'a, I>(&self, mut directory: MemberDirectory, operations: I) -> MemberDirectory
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        self.extend_with_report(&mut directory, operations);
        directory
    }

    /// Incremental append in place, returning the batch report
    pub fn extend_with_report<'a, I>(
        &self,
        directory: &mut MemberDirectory,
        operations: I,
    ) -> ReplayReport
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let span = tracing::debug_span!("replay", from_version = %directory.version());
        let _guard = span.enter();

        let mut report = ReplayReport::default();
        for op in operations {
            match self.apply(directory, op) {
                Ok(ApplyOutcome::Applied) => {
                    trace!(operation_id = %op.id, op_code = op.op_code(), "applied operation");
                    report.applied += 1;
                }
                Ok(ApplyOutcome::Ignored) => {
                    trace!(operation_id = %op.id, op_code = op.op_code(), "ignored operation");
                    report.ignored += 1;
                }
                Err(reason) => {
                    warn!(
                        operation_id = %op.id,
                        op_code = op.op_code(),
                        reason = %reason,
                        "skipping invalid operation"
                    );
                    report.skipped.push(SkippedOperation {
                        operation_id: op.id.clone(),
                        reason,
                    });
                }
            }
        }

        debug!(
            applied = report.applied,
            ignored = report.ignored,
            skipped = report.skipped.len(),
            version = %directory.version(),
            "replay batch complete"
        );
        report
    }

    /// Apply one operation.
    ///
    /// On `Err` the directory is unchanged.
    pub fn apply(
        &self,
        directory: &mut MemberDirectory,
        op: &Operation,
    ) -> Result<ApplyOutcome, InvalidOperation> {
        if matches!(
            op.payload,
            OperationPayload::Invite { .. } | OperationPayload::Unrecognized { .. }
        ) {
            return Ok(ApplyOutcome::Ignored);
        }

        let Some(creator) = op.creator_id.as_ref() else {
            if self.config.is_genesis(&op.id) {
                return Ok(ApplyOutcome::Ignored);
            }
            return Err(InvalidOperation::MissingCreator);
        };

        match &op.payload {
            OperationPayload::RequestInvite {
                to_uid,
                full_name,
                username,
            } => self.apply_request_invite(
                directory,
                op,
                creator,
                to_uid.as_ref(),
                full_name,
                username,
            )?,
            OperationPayload::CreateMember {
                full_name,
                username,
                request_invite_from_member_id,
            } => apply_create_member(
                directory,
                op,
                creator,
                request_invite_from_member_id.as_ref(),
                full_name,
                username,
            )?,
            OperationPayload::Trust { to_uid } => {
                apply_trust(directory, creator, to_uid.as_ref())?
            }
            OperationPayload::Mint { amount, .. } => apply_mint(directory, op, creator, amount)?,
            OperationPayload::Give {
                to_uid,
                amount,
                donation_amount,
                ..
            } => apply_give(directory, creator, to_uid.as_ref(), amount, donation_amount)?,
            OperationPayload::Verify { to_uid, .. } => {
                apply_verify(directory, creator, to_uid.as_ref())?
            }
            OperationPayload::RequestVerification { to_uid } => {
                apply_request_verification(directory, creator, to_uid.as_ref())?
            }
            OperationPayload::EditMember {
                full_name,
                username,
            } => apply_edit_member(directory, creator, full_name.as_deref(), username.as_deref())?,
            OperationPayload::FlagMember { to_uid, .. } => {
                apply_flag_member(directory, op, creator, to_uid.as_ref())?
            }
            OperationPayload::ResolveFlagMember {
                to_uid,
                operation_to_resolve_id,
                ..
            } => apply_resolve_flag(directory, creator, to_uid.as_ref(), operation_to_resolve_id)?,
            OperationPayload::Invite { .. } | OperationPayload::Unrecognized { .. } => {
                return Ok(ApplyOutcome::Ignored);
            }
        }

        if let Some(member) = directory.get_mut(creator) {
            member.last_op_created_at = op.created_at;
        }
        directory.record_applied(&op.id);
        Ok(ApplyOutcome::Applied)
    }

    fn apply_request_invite(
        &self,
        directory: &mut MemberDirectory,
        op: &Operation,
        creator: &MemberId,
        to_uid: Option<&MemberId>,
        full_name: &str,
        username: &str,
    ) -> Result<(), InvalidOperation> {
        ensure_new(directory, creator, username)?;

        let inviter = if self.config.is_genesis_request_invite(&op.id) {
            Inviter::Genesis
        } else {
            let inviter_id = required_target(to_uid)?;
            require(directory, inviter_id)?;
            Inviter::Member(inviter_id.clone())
        };

        let mut member = Member::new(
            creator.clone(),
            username.to_string(),
            full_name.to_string(),
            op.created_at,
            Some(inviter.clone()),
        );
        if let Inviter::Member(inviter_id) = &inviter {
            // an invite is an implicit mutual first trust edge
            member.trusts.insert(inviter_id.clone());
            if let Some(inviter) = directory.get_mut(inviter_id) {
                inviter.invited.insert(creator.clone());
                inviter.trusted_by.insert(creator.clone());
            }
        }
        directory.insert(member);
        Ok(())
    }
}

/// Full rebuild with the default configuration
pub fn replay<'a, I>(operations: I) -> MemberDirectory
where
    I: IntoIterator<Item = &'a Operation>,
{
    ReplayEngine::default().replay(operations)
}

/// Incremental append with the default configuration
pub fn extend<'a, I>(directory: MemberDirectory, operations: I) -> MemberDirectory
where
    I: IntoIterator<Item = &'a Operation>,
{
    ReplayEngine::default().extend(directory, operations)
}

fn require<'d>(
    directory: &'d MemberDirectory,
    id: &MemberId,
) -> Result<&'d Member, InvalidOperation> {
    directory
        .get(id)
        .ok_or_else(|| InvalidOperation::MemberNotFound(id.clone()))
}

fn required_target(to_uid: Option<&MemberId>) -> Result<&MemberId, InvalidOperation> {
    to_uid.ok_or(InvalidOperation::MissingField("to_uid"))
}

fn amount(field: &'static str, raw: &str) -> Result<BigDecimal, InvalidOperation> {
    parse_amount(raw).ok_or_else(|| InvalidOperation::InvalidAmount {
        field,
        value: raw.to_string(),
    })
}

fn ensure_new(
    directory: &MemberDirectory,
    creator: &MemberId,
    username: &str,
) -> Result<(), InvalidOperation> {
    if directory.contains(creator) {
        return Err(InvalidOperation::MemberAlreadyExists(creator.clone()));
    }
    if directory.username_taken(username) {
        return Err(InvalidOperation::UsernameTaken(username.to_string()));
    }
    Ok(())
}

fn apply_create_member(
    directory: &mut MemberDirectory,
    op: &Operation,
    creator: &MemberId,
    inviter: Option<&MemberId>,
    full_name: &str,
    username: &str,
) -> Result<(), InvalidOperation> {
    ensure_new(directory, creator, username)?;
    if let Some(inviter) = inviter {
        require(directory, inviter)?;
    }

    directory.insert(Member::new(
        creator.clone(),
        username.to_string(),
        full_name.to_string(),
        op.created_at,
        inviter.map(|id| Inviter::Member(id.clone())),
    ));
    if let Some(inviter) = inviter.and_then(|id| directory.get_mut(id)) {
        inviter.invited.insert(creator.clone());
    }
    Ok(())
}

fn apply_trust(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    require(directory, target)?;

    if let Some(truster) = directory.get_mut(creator) {
        truster.trusts.insert(target.clone());
    }
    if let Some(trusted) = directory.get_mut(target) {
        trusted.trusted_by.insert(creator.clone());
        if trusted.inviter_id() == Some(creator) {
            trusted.invite_confirmed = true;
        }
    }
    Ok(())
}

fn apply_mint(
    directory: &mut MemberDirectory,
    op: &Operation,
    creator: &MemberId,
    raw_amount: &str,
) -> Result<(), InvalidOperation> {
    require(directory, creator)?;
    let minted = amount("amount", raw_amount)?;

    if let Some(minter) = directory.get_mut(creator) {
        minter.balance = &minter.balance + &minted;
        minter.total_minted = &minter.total_minted + &minted;
        minter.last_minted = Some(op.created_at);
    }
    Ok(())
}

fn apply_give(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
    raw_amount: &str,
    raw_donation: &str,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    require(directory, target)?;
    let given = amount("amount", raw_amount)?;
    let donation = amount("donation_amount", raw_donation)?;

    // the donation leaves circulation; no tracked member receives it
    if let Some(giver) = directory.get_mut(creator) {
        giver.balance = &giver.balance - &(&given + &donation);
    }
    if let Some(recipient) = directory.get_mut(target) {
        recipient.balance = &recipient.balance + &given;
        recipient.total_donated = &recipient.total_donated + &donation;
    }
    Ok(())
}

fn apply_verify(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    require(directory, target)?;

    if let Some(verifier) = directory.get_mut(creator) {
        verifier.verified.insert(target.clone());
    }
    if let Some(verified) = directory.get_mut(target) {
        verified.verified_by.insert(creator.clone());
        if verified.inviter_id() == Some(creator) {
            verified.invite_confirmed = true;
        }
    }
    Ok(())
}

fn apply_request_verification(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    require(directory, target)?;

    if let Some(requester) = directory.get_mut(creator) {
        requester.requested_verification_from.insert(target.clone());
    }
    if let Some(requestee) = directory.get_mut(target) {
        requestee.requested_for_verification_by.insert(creator.clone());
    }
    Ok(())
}

fn apply_edit_member(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    full_name: Option<&str>,
    username: Option<&str>,
) -> Result<(), InvalidOperation> {
    let member = require(directory, creator)?;
    let rename = match username {
        Some(username) if username != member.username() => {
            if directory.username_taken(username) {
                return Err(InvalidOperation::UsernameTaken(username.to_string()));
            }
            Some(username.to_string())
        }
        _ => None,
    };

    if let Some(full_name) = full_name {
        if let Some(member) = directory.get_mut(creator) {
            member.full_name = full_name.to_string();
        }
    }
    if let Some(username) = rename {
        directory.rename(creator, username);
    }
    Ok(())
}

fn apply_flag_member(
    directory: &mut MemberDirectory,
    op: &Operation,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    require(directory, target)?;

    if let Some(flagged) = directory.get_mut(target) {
        flagged.open_flags.insert(op.id.clone());
    }
    Ok(())
}

fn apply_resolve_flag(
    directory: &mut MemberDirectory,
    creator: &MemberId,
    to_uid: Option<&MemberId>,
    flag: &OperationId,
) -> Result<(), InvalidOperation> {
    let target = required_target(to_uid)?;
    require(directory, creator)?;
    if !require(directory, target)?.open_flags.contains(flag) {
        return Err(InvalidOperation::FlagNotOpen {
            member: target.clone(),
            flag: flag.clone(),
        });
    }

    if let Some(flagged) = directory.get_mut(target) {
        flagged.open_flags.remove(flag);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::fixtures::*;

    fn engine() -> ReplayEngine {
        ReplayEngine::new(LedgerConfig::empty().with_genesis_request_invite_ops(["g-alice"]))
    }

    fn id(raw: &str) -> MemberId {
        MemberId::from(raw)
    }

    fn seeded() -> MemberDirectory {
        engine().replay(&[
            genesis_invite("g-alice", "alice", "alice", at_hours(0)),
            request_invite("op-bob", "bob", "alice", "bob", at_hours(1)),
        ])
    }

    #[test]
    fn test_genesis_invite_seeds_member() {
        let dir = engine().replay(&[genesis_invite("g-alice", "alice", "alice", at_hours(0))]);
        let alice = dir.get(&id("alice")).unwrap();
        assert_eq!(alice.invited_by(), Some(&Inviter::Genesis));
        assert_eq!(alice.balance(), &BigDecimal::default());
        assert_eq!(dir.version().applied(), 1);
    }

    #[test]
    fn test_request_invite_links_inviter() {
        let dir = seeded();
        let alice = dir.get(&id("alice")).unwrap();
        let bob = dir.get(&id("bob")).unwrap();
        assert!(alice.invited().contains(&id("bob")));
        assert!(alice.trusted_by().contains(&id("bob")));
        assert!(bob.trusts().contains(&id("alice")));
        assert_eq!(bob.inviter_id(), Some(&id("alice")));
    }

    #[test]
    fn test_request_invite_requires_existing_inviter() {
        let mut dir = seeded();
        let op = request_invite("op-carol", "carol", "nobody", "carol", at_hours(2));
        let err = engine().apply(&mut dir, &op).unwrap_err();
        assert_eq!(err, InvalidOperation::MemberNotFound(id("nobody")));
        assert!(!dir.contains(&id("carol")));
    }

    #[test]
    fn test_non_genesis_invite_without_inviter_is_invalid() {
        let mut dir = seeded();
        let op = genesis_invite("op-x", "carol", "carol", at_hours(2));
        assert_eq!(
            engine().apply(&mut dir, &op),
            Err(InvalidOperation::MissingField("to_uid"))
        );
    }

    #[test]
    fn test_duplicate_member_and_username_rejected() {
        let mut dir = seeded();
        let before = dir.clone();
        let dup = request_invite("op-dup", "bob", "alice", "bobby", at_hours(2));
        assert_eq!(
            engine().apply(&mut dir, &dup),
            Err(InvalidOperation::MemberAlreadyExists(id("bob")))
        );
        let taken = request_invite("op-taken", "carol", "alice", "bob", at_hours(2));
        assert_eq!(
            engine().apply(&mut dir, &taken),
            Err(InvalidOperation::UsernameTaken("bob".to_string()))
        );
        assert_eq!(dir, before);
    }

    #[test]
    fn test_create_member_without_inviter() {
        let mut dir = seeded();
        let op = create_member("op-c", "carol", None, "carol", at_hours(2));
        assert_eq!(engine().apply(&mut dir, &op), Ok(ApplyOutcome::Applied));
        let carol = dir.get(&id("carol")).unwrap();
        assert_eq!(carol.invited_by(), None);
        assert!(carol.trusts().is_empty());

        let op = create_member("op-d", "dave", Some("bob"), "dave", at_hours(3));
        engine().apply(&mut dir, &op).unwrap();
        assert_eq!(dir.get(&id("dave")).unwrap().inviter_id(), Some(&id("bob")));
        let bob = dir.get(&id("bob")).unwrap();
        assert!(bob.trusted_by().is_empty());
        assert!(bob.invited().contains(&id("dave")));
    }

    #[test]
    fn test_trust_by_inviter_confirms_invite() {
        let mut dir = seeded();
        engine()
            .apply(&mut dir, &trust("op-t", "alice", "bob", at_hours(2)))
            .unwrap();
        let bob = dir.get(&id("bob")).unwrap();
        assert!(bob.trusted_by().contains(&id("alice")));
        assert!(bob.invite_confirmed());
        assert!(dir.get(&id("alice")).unwrap().trusts().contains(&id("bob")));
    }

    #[test]
    fn test_mint_rejects_bad_amount() {
        let mut dir = seeded();
        let before = dir.clone();
        let op = mint_basic_income("op-m", "alice", "lots", at_hours(2));
        assert!(matches!(
            engine().apply(&mut dir, &op),
            Err(InvalidOperation::InvalidAmount { field: "amount", .. })
        ));
        assert_eq!(dir, before);
    }

    #[test]
    fn test_give_with_bad_donation_leaves_state_untouched() {
        let mut dir = engine().extend(
            seeded(),
            &[mint_basic_income("op-m", "alice", "10", at_hours(2))],
        );
        let before = dir.clone();
        let op = give("op-g", "alice", "bob", "5", "", at_hours(3));
        assert!(matches!(
            engine().apply(&mut dir, &op),
            Err(InvalidOperation::InvalidAmount { field: "donation_amount", .. })
        ));
        assert_eq!(dir, before);
    }

    #[test]
    fn test_verify_and_request_verification_are_dual() {
        let dir = engine().extend(
            seeded(),
            &[
                request_verification("op-r", "bob", "alice", at_hours(2)),
                verify("op-v", "alice", "bob", at_hours(3)),
            ],
        );
        let alice = dir.get(&id("alice")).unwrap();
        let bob = dir.get(&id("bob")).unwrap();
        assert!(bob.requested_verification_from().contains(&id("alice")));
        assert!(alice.requested_for_verification_by().contains(&id("bob")));
        assert!(alice.verified().contains(&id("bob")));
        assert!(bob.is_verified());
        assert!(bob.invite_confirmed());
    }

    #[test]
    fn test_edit_member_renames() {
        let mut dir = seeded();
        let op = edit_member("op-e", "bob", Some("Robert"), Some("rob"), at_hours(2));
        engine().apply(&mut dir, &op).unwrap();
        assert_eq!(dir.get_by_username("rob").unwrap().full_name(), "Robert");
        assert!(dir.get_by_username("bob").is_none());

        let clash = edit_member("op-e3", "bob", None, Some("alice"), at_hours(3));
        assert_eq!(
            engine().apply(&mut dir, &clash),
            Err(InvalidOperation::UsernameTaken("alice".to_string()))
        );
    }

    #[test]
    fn test_flag_and_resolve() {
        let mut dir = engine().extend(
            seeded(),
            &[flag_member("op-f", "alice", "bob", "spam", at_hours(2))],
        );
        assert!(dir.get(&id("bob")).unwrap().is_flagged());

        let wrong = resolve_flag("op-r0", "alice", "bob", "op-missing", "ok", at_hours(3));
        assert!(matches!(
            engine().apply(&mut dir, &wrong),
            Err(InvalidOperation::FlagNotOpen { .. })
        ));

        let resolve = resolve_flag("op-r1", "alice", "bob", "op-f", "ok", at_hours(3));
        engine().apply(&mut dir, &resolve).unwrap();
        assert!(!dir.get(&id("bob")).unwrap().is_flagged());
    }

    #[test]
    fn test_ignored_operations_do_not_advance_version() {
        let mut dir = seeded();
        let version = dir.version();
        assert_eq!(
            engine().apply(&mut dir, &invite("op-i", "alice", at_hours(2))),
            Ok(ApplyOutcome::Ignored)
        );
        assert_eq!(
            engine().apply(&mut dir, &unrecognized("op-u", "alice", "WARP", at_hours(2))),
            Ok(ApplyOutcome::Ignored)
        );
        assert_eq!(dir.version(), version);
    }

    #[test]
    fn test_missing_creator() {
        let engine = ReplayEngine::new(LedgerConfig::empty().with_genesis_trust_ops(["g-trust"]));
        let mut dir = MemberDirectory::new();

        let mut genesis_trust = trust("g-trust", "x", "y", at_hours(0));
        genesis_trust.creator_id = None;
        assert_eq!(engine.apply(&mut dir, &genesis_trust), Ok(ApplyOutcome::Ignored));

        let mut orphan = trust("op-t", "x", "y", at_hours(0));
        orphan.creator_id = None;
        assert_eq!(
            engine.apply(&mut dir, &orphan),
            Err(InvalidOperation::MissingCreator)
        );
    }

    #[test]
    fn test_last_op_created_at_tracks_creator() {
        let dir = engine().extend(seeded(), &[trust("op-t", "alice", "bob", at_hours(5))]);
        assert_eq!(dir.get(&id("alice")).unwrap().last_op_created_at(), at_hours(5));
        assert_eq!(dir.get(&id("bob")).unwrap().last_op_created_at(), at_hours(1));
    }

    #[test]
    fn test_report_counts() {
        let ops = vec![
            genesis_invite("g-alice", "alice", "alice", at_hours(0)),
            invite("op-i", "alice", at_hours(1)),
            trust("op-bad", "alice", "ghost", at_hours(2)),
        ];
        let (_, report) = engine().replay_with_report(&ops);
        assert_eq!(report.applied, 1);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].operation_id, OperationId::from("op-bad"));
        assert_eq!(report.total(), 3);
        assert!(!report.is_clean());
        assert!(report.was_skipped(&OperationId::from("op-bad")));
        assert!(!report.was_skipped(&OperationId::from("op-i")));
    }

    #[test]
    fn test_report_merge_across_batches() {
        let engine = engine();
        let mut dir = MemberDirectory::new();
        let mut report = engine.extend_with_report(
            &mut dir,
            &[
                genesis_invite("g-alice", "alice", "alice", at_hours(0)),
                trust("op-bad-1", "alice", "ghost", at_hours(1)),
            ],
        );
        report.merge(engine.extend_with_report(
            &mut dir,
            &[
                invite("op-i", "alice", at_hours(2)),
                mint_basic_income("op-bad-2", "alice", "lots", at_hours(3)),
            ],
        ));
        assert_eq!(report.applied, 1);
        assert_eq!(report.ignored, 1);
        let skipped: Vec<_> = report
            .skipped_ids()
            .into_iter()
            .map(OperationId::as_str)
            .collect();
        assert_eq!(skipped, vec!["op-bad-1", "op-bad-2"]);
    }
}
