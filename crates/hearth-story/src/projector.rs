//! Story projection
//!
//! [`StoryProjector`] renders activities into stories against a member
//! directory. Each activity kind has a fixed chain shape. Basic-income mints
//! are bundled by time window as they are projected, so a bundle's story
//! keeps the position of its first mint.
//!
//! Projection is fail-fast: a missing member, a malformed amount or an
//! activity of an unexpected shape aborts the whole projection.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use hearth_core::{
    parse_amount, MemberId, MintType, Operation, OperationPayload, ProjectionError,
};
use hearth_ledger::{DirectoryVersion, Member, MemberDirectory};
use tracing::{debug, trace, warn};

use crate::activity::{
    Activity, ActivityLog, ActivityLogVersion, FlagMemberActivity, NewMemberActivity,
};
use crate::bundle::BundleState;
use crate::config::StoryConfig;
use crate::story::{
    Actors, ChainDirection, CurrencyRole, DescriptionPiece, NextInChain, Story, StoryBody,
    StoryContent, StoryId, StoryKind, VideoReference,
};

/// Renders activities into stories
#[derive(Debug, Clone, Default)]
pub struct StoryProjector {
    config: StoryConfig,
}

impl StoryProjector {
    pub fn new(config: StoryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// Project activities, oldest first, into stories in the same order,
    /// bundling basic-income mints.
    ///
    /// Stories are ordered by their first operation ([`Story::started_at`]).
    /// `timestamp` is the newest operation, so a bundle, a verified join or a
    /// resolved flag can carry a later timestamp than the story after it.
    pub fn project(
        &self,
        activities: &[Activity],
        directory: &MemberDirectory,
    ) -> Result<Vec<Story>, ProjectionError> {
        let span = tracing::debug_span!("project", activities = activities.len());
        let _guard = span.enter();

        let window = self.config.mint_bundle_window();
        let mut stories: Vec<Story> = Vec::with_capacity(activities.len());
        let mut bundle: Option<BundleState> = None;

        for activity in activities {
            let Some((mint, amount)) = basic_income_mint(activity)? else {
                if let Some(story) = self.project_activity(activity, directory)? {
                    stories.push(story);
                }
                continue;
            };

            let minter = creator(mint)?;
            require(directory, minter, mint)?;

            match bundle.as_mut() {
                Some(open) if open.accepts(mint.created_at, window) => {
                    open.absorb(&amount);
                    let story = stories.get_mut(open.story_index).ok_or_else(|| {
                        ProjectionError::UnexpectedShape(format!(
                            "bundle {} points past the end of the story list",
                            open.bundle_id
                        ))
                    })?;
                    merge_mint(story, activity, minter, &amount, &open.running_total);
                    trace!(
                        operation_id = %mint.id,
                        bundle = %open.bundle_id,
                        "bundled basic income mint"
                    );
                }
                _ => {
                    let story = self.mint_story(activity, mint, minter, amount.clone());
                    if let Some(closed) = bundle.take() {
                        debug!(
                            bundle = %closed.bundle_id,
                            total = %closed.running_total,
                            "closed mint bundle"
                        );
                    }
                    bundle = Some(BundleState::open(
                        story.id.clone(),
                        stories.len(),
                        amount,
                        mint.created_at,
                    ));
                    stories.push(story);
                }
            }
        }

        debug!(stories = stories.len(), "projected stories");
        Ok(stories)
    }

    /// Project a single activity without bundling. Creator-less
    /// verifications and trust grants yield no story.
    pub fn project_activity(
        &self,
        activity: &Activity,
        directory: &MemberDirectory,
    ) -> Result<Option<Story>, ProjectionError> {
        match activity {
            Activity::NewMember(new_member) => {
                self.new_member_story(activity, new_member, directory).map(Some)
            }
            Activity::FlagMember(flag) => flag_story(activity, flag, directory).map(Some),
            Activity::IndependentOperation(op) => self.independent_story(activity, op, directory),
        }
    }

    /// Split a story back into one story per source activity
    pub fn unbundle(
        &self,
        story: &Story,
        directory: &MemberDirectory,
    ) -> Result<Vec<Story>, ProjectionError> {
        let mut stories = Vec::with_capacity(story.unbundled.len());
        for activity in &story.unbundled {
            if let Some(story) = self.project_activity(activity, directory)? {
                stories.push(story);
            }
        }
        Ok(stories)
    }

    fn new_member_story(
        &self,
        activity: &Activity,
        new_member: &NewMemberActivity,
        directory: &MemberDirectory,
    ) -> Result<Story, ProjectionError> {
        let join = new_member.join();
        let member = creator(join)?;
        require(directory, member, join)?;
        let inviter = join.target();

        let content = StoryContent::new(
            Actors::member(member.clone()),
            vec![DescriptionPiece::text("just joined!")],
        )
        .with_body(StoryBody::Media(vec![self.config.member_video(member)]));

        let (timestamp, facilitator) = match new_member {
            NewMemberActivity::Joined { join } => {
                let facilitator = match inviter {
                    Some(inviter) => {
                        require(directory, inviter, join)?;
                        Some((inviter.clone(), vec![DescriptionPiece::text("invited them.")]))
                    }
                    None => None,
                };
                (join.created_at, facilitator)
            }
            NewMemberActivity::Verified { verify, .. } => {
                let verifier = creator(verify)?;
                require(directory, verifier, verify)?;
                let description = if Some(verifier) == inviter {
                    "invited them, and verified their identity."
                } else {
                    "verified their identity."
                };
                (
                    verify.created_at,
                    Some((verifier.clone(), vec![DescriptionPiece::text(description)])),
                )
            }
            NewMemberActivity::BonusMinted { verify, mint, .. } => {
                let minter = creator(mint)?;
                if Some(minter) != inviter {
                    return Err(ProjectionError::UnexpectedShape(format!(
                        "referral bonus {} minted by {} who did not invite {}",
                        mint.id, minter, member
                    )));
                }
                if verify.creator_id.as_ref() != inviter {
                    warn!(
                        operation_id = %verify.id,
                        member_id = %member,
                        "new member verified by someone other than their inviter"
                    );
                }
                require(directory, minter, mint)?;
                let OperationPayload::Mint { amount, .. } = &mint.payload else {
                    return Err(unexpected_payload(mint));
                };
                let bonus = parse(mint, amount)?;
                (
                    mint.created_at,
                    Some((
                        minter.clone(),
                        vec![
                            DescriptionPiece::text("invited them, and minted a referral bonus of"),
                            DescriptionPiece::currency(bonus, CurrencyRole::Transaction),
                            DescriptionPiece::text("after verifying their identity!"),
                        ],
                    )),
                )
            }
        };

        let content = match facilitator {
            Some((facilitator, description)) => content.chain_to(
                ChainDirection::Bidirectional,
                StoryContent::new(Actors::member(facilitator), description),
            )?,
            None => content,
        };

        Ok(story(StoryKind::NewMember, activity, timestamp, content))
    }

    fn independent_story(
        &self,
        activity: &Activity,
        op: &Operation,
        directory: &MemberDirectory,
    ) -> Result<Option<Story>, ProjectionError> {
        // bootstrap verifications and trust grants have no creator and no story
        if op.creator_id.is_none()
            && matches!(
                op.payload,
                OperationPayload::Verify { .. } | OperationPayload::Trust { .. }
            )
        {
            return Ok(None);
        }

        let actor = creator(op)?;
        require(directory, actor, op)?;

        let (kind, content) = match &op.payload {
            OperationPayload::Give {
                to_uid,
                amount,
                donation_amount,
                memo,
                ..
            } => {
                let recipient = target(op, to_uid.as_ref())?;
                require(directory, recipient, op)?;
                let amount = parse(op, amount)?;
                let donation = parse(op, donation_amount)?;
                let given = &amount + &donation;

                let content = StoryContent::new(
                    Actors::member(actor.clone()),
                    vec![
                        DescriptionPiece::text("gave"),
                        DescriptionPiece::currency(given, CurrencyRole::Transaction),
                        DescriptionPiece::text("for"),
                    ],
                )
                .with_body(StoryBody::Text(memo.clone().unwrap_or_default()))
                .chain_to(
                    ChainDirection::Forward,
                    StoryContent::new(
                        Actors::member(recipient.clone()),
                        vec![
                            DescriptionPiece::text("donated"),
                            DescriptionPiece::currency(donation, CurrencyRole::Donation),
                            DescriptionPiece::text("to the basic income pool."),
                        ],
                    ),
                )?;
                (StoryKind::Give, content)
            }
            OperationPayload::Mint {
                amount,
                mint_type: MintType::BasicIncome,
            } => {
                let amount = parse(op, amount)?;
                let story = self.mint_story(activity, op, actor, amount);
                return Ok(Some(story));
            }
            OperationPayload::Trust { to_uid } => {
                let trusted = target(op, to_uid.as_ref())?;
                require(directory, trusted, op)?;
                let content = StoryContent::new(
                    Actors::member(actor.clone()),
                    vec![DescriptionPiece::text("trusted a new friend.")],
                )
                .with_body(StoryBody::TrustMember(vec![(actor.clone(), trusted.clone())]))
                .chain_to(ChainDirection::Forward, bare(trusted))?;
                (StoryKind::TrustMember, content)
            }
            OperationPayload::Verify { to_uid, video_url } => {
                let verified = target(op, to_uid.as_ref())?;
                require(directory, verified, op)?;
                let video = match video_url {
                    Some(uri) => VideoReference::for_uri(uri.clone()),
                    None => self.config.member_video(verified),
                };
                let content = StoryContent::new(
                    Actors::member(actor.clone()),
                    vec![DescriptionPiece::text("verified their friend's account!")],
                )
                .with_body(StoryBody::Media(vec![video]))
                .chain_to(ChainDirection::Forward, bare(verified))?;
                (StoryKind::VerifyMember, content)
            }
            OperationPayload::RequestVerification { to_uid } => {
                let requested = target(op, to_uid.as_ref())?;
                require(directory, requested, op)?;
                let content = StoryContent::new(
                    Actors::member(actor.clone()),
                    vec![DescriptionPiece::text(
                        "requested a friend to verify their account.",
                    )],
                )
                .with_body(StoryBody::Media(vec![self.config.member_video(actor)]))
                .chain_to(ChainDirection::NonDirectional, bare(requested))?;
                (StoryKind::RequestVerification, content)
            }
            OperationPayload::EditMember { full_name, .. } => {
                let description = if full_name.is_some() {
                    "edited their name."
                } else {
                    "edited their profile."
                };
                let content = StoryContent::new(
                    Actors::member(actor.clone()),
                    vec![DescriptionPiece::text(description)],
                );
                (StoryKind::EditMember, content)
            }
            _ => return Err(unexpected_payload(op)),
        };

        Ok(Some(story(kind, activity, op.created_at, content)))
    }

    /// Story for one basic-income mint, before any bundling
    fn mint_story(
        &self,
        activity: &Activity,
        mint: &Operation,
        minter: &MemberId,
        amount: BigDecimal,
    ) -> Story {
        let content = StoryContent::new(
            Actors::member(minter.clone()),
            mint_description(1, &amount),
        )
        .with_body(StoryBody::MintBasicIncome {
            minted: vec![(minter.clone(), amount.clone())],
            total: amount,
        });
        // a two-link chain is always within the depth bound
        let content = StoryContent {
            next: Some(NextInChain {
                direction: ChainDirection::NonDirectional,
                next_content: Box::new(StoryContent::new(Actors::BasicIncomePool, Vec::new())),
            }),
            ..content
        };
        story(StoryKind::MintBasicIncome, activity, mint.created_at, content)
    }
}

fn flag_story(
    activity: &Activity,
    flag: &FlagMemberActivity,
    directory: &MemberDirectory,
) -> Result<Story, ProjectionError> {
    let flag_op = &flag.flag;
    let OperationPayload::FlagMember { to_uid, reason } = &flag_op.payload else {
        return Err(unexpected_payload(flag_op));
    };
    let flagger = creator(flag_op)?;
    require(directory, flagger, flag_op)?;
    let flagged = target(flag_op, to_uid.as_ref())?;
    require(directory, flagged, flag_op)?;

    let flag_content = StoryContent::new(
        Actors::member(flagger.clone()),
        vec![DescriptionPiece::text("flagged an account.")],
    )
    .with_body(StoryBody::Text(reason.clone()))
    .chain_to(ChainDirection::Forward, bare(flagged))?;

    let Some(resolution) = &flag.resolution else {
        return Ok(story(StoryKind::FlagMember, activity, flag_op.created_at, flag_content));
    };

    let OperationPayload::ResolveFlagMember { reason, .. } = &resolution.payload else {
        return Err(unexpected_payload(resolution));
    };
    let resolver = creator(resolution)?;
    require(directory, resolver, resolution)?;
    let content = StoryContent::new(
        Actors::member(resolver.clone()),
        vec![DescriptionPiece::text("resolved a flag.")],
    )
    .with_body(StoryBody::Text(reason.clone()))
    .chain_to(ChainDirection::Forward, flag_content)?;

    Ok(story(StoryKind::FlagMember, activity, resolution.created_at, content))
}

/// Fold another basic-income mint into a bundle story
fn merge_mint(
    story: &mut Story,
    activity: &Activity,
    minter: &MemberId,
    amount: &BigDecimal,
    running_total: &BigDecimal,
) {
    let mint_at = activity.first_operation().created_at;
    if mint_at > story.timestamp {
        story.timestamp = mint_at;
    }
    story.unbundled.push(activity.clone());

    let content = &mut story.content;
    content.actors.push(minter.clone());
    content.description = mint_description(content.actors.len(), running_total);

    if let Some(StoryBody::MintBasicIncome { minted, total }) = content.body.as_mut() {
        match minted.iter_mut().find(|(id, _)| id == minter) {
            Some((_, sum)) => *sum = &*sum + amount,
            None => minted.push((minter.clone(), amount.clone())),
        }
        *total = running_total.clone();
    }
}

/// Several minters share one line; a single minter gets the total named
fn mint_description(actors: usize, total: &BigDecimal) -> Vec<DescriptionPiece> {
    if actors > 1 {
        vec![DescriptionPiece::text("minted their basic income.")]
    } else {
        vec![
            DescriptionPiece::text("minted"),
            DescriptionPiece::currency(total.clone(), CurrencyRole::Transaction),
            DescriptionPiece::text("of basic income."),
        ]
    }
}

/// The mint operation and amount of a basic-income activity, if it is one
fn basic_income_mint(
    activity: &Activity,
) -> Result<Option<(&Operation, BigDecimal)>, ProjectionError> {
    let Activity::IndependentOperation(op) = activity else {
        return Ok(None);
    };
    match &op.payload {
        OperationPayload::Mint {
            amount,
            mint_type: MintType::BasicIncome,
        } => Ok(Some((op, parse(op, amount)?))),
        _ => Ok(None),
    }
}

fn story(
    kind: StoryKind,
    activity: &Activity,
    timestamp: DateTime<Utc>,
    content: StoryContent,
) -> Story {
    Story {
        id: StoryId::derive(kind, activity.operations().into_iter().map(|op| &op.id)),
        timestamp,
        kind,
        content,
        unbundled: vec![activity.clone()],
    }
}

/// A chain link naming a member with no description of its own
fn bare(member: &MemberId) -> StoryContent {
    StoryContent::new(Actors::member(member.clone()), Vec::new())
}

fn creator(op: &Operation) -> Result<&MemberId, ProjectionError> {
    op.creator_id.as_ref().ok_or_else(|| missing(op, "creator"))
}

fn target<'a>(
    op: &Operation,
    to_uid: Option<&'a MemberId>,
) -> Result<&'a MemberId, ProjectionError> {
    to_uid.ok_or_else(|| missing(op, "target"))
}

fn missing(op: &Operation, what: &str) -> ProjectionError {
    ProjectionError::UnexpectedShape(format!(
        "{} operation {} has no {}",
        op.op_code(),
        op.id,
        what
    ))
}

fn require<'d>(
    directory: &'d MemberDirectory,
    member: &MemberId,
    op: &Operation,
) -> Result<&'d Member, ProjectionError> {
    directory.get(member).ok_or_else(|| ProjectionError::MemberNotFound {
        member: member.clone(),
        operation: op.id.clone(),
    })
}

fn parse(op: &Operation, raw: &str) -> Result<BigDecimal, ProjectionError> {
    parse_amount(raw).ok_or_else(|| ProjectionError::InvalidAmount {
        operation: op.id.clone(),
        value: raw.to_string(),
    })
}

fn unexpected_payload(op: &Operation) -> ProjectionError {
    ProjectionError::UnexpectedShape(format!(
        "{} operation {} cannot seed a story here",
        op.op_code(),
        op.id
    ))
}

/// Stories memoized against the activity log and directory they came from
#[derive(Debug, Clone, Default)]
pub struct ProjectionCache {
    key: Option<(ActivityLogVersion, DirectoryVersion)>,
    stories: Vec<Story>,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fresh(&self, log: &ActivityLog, directory: &MemberDirectory) -> bool {
        self.key == Some((log.version(), directory.version()))
    }

    /// Stories for `log` against `directory`, reprojected if either changed
    pub fn stories(
        &mut self,
        projector: &StoryProjector,
        log: &ActivityLog,
        directory: &MemberDirectory,
    ) -> Result<&[Story], ProjectionError> {
        if !self.is_fresh(log, directory) {
            debug!(
                activities = %log.version(),
                directory = %directory.version(),
                "reprojecting stories"
            );
            self.invalidate();
            self.stories = projector.project(log.activities(), directory)?;
            self.key = Some((log.version(), directory.version()));
        }
        Ok(&self.stories)
    }

    pub fn invalidate(&mut self) {
        self.key = None;
        self.stories.clear();
    }
}
