//! Trust graph analysis
//!
//! Queries over the inviter forest of a [`MemberDirectory`]. Every member
//! votes for its whole inviter lineage, itself included, so a member's tally
//! is the size of the subtree it roots.
//!
//! # Key Types
//!
//! - [`ancestor_chain`] / [`ancestors`]: walk `invited_by` links to the root
//! - [`vote_counts`]: per-member vote tally
//! - [`VoteCache`]: tally memo keyed by [`DirectoryVersion`]

use std::collections::{BTreeMap, BTreeSet};

use hearth_core::{MemberId, TrustGraphError};
use tracing::debug;

use crate::directory::{DirectoryVersion, MemberDirectory};
use crate::member::Member;

/// The inviter chain of `member`: the member itself first, then each
/// inviter in turn up to a root (genesis-seeded or uninvited).
///
/// Every id is visited at most once, so the walk takes at most
/// `directory.len()` steps before either reaching a root or reporting
/// [`TrustGraphError::CycleDetected`].
pub fn ancestor_chain(
    member: &MemberId,
    directory: &MemberDirectory,
) -> Result<Vec<MemberId>, TrustGraphError> {
    let mut chain = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = member.clone();

    loop {
        if !seen.insert(current.clone()) {
            return Err(TrustGraphError::CycleDetected(current));
        }
        let entry = directory
            .get(&current)
            .ok_or_else(|| TrustGraphError::MissingMember(current.clone()))?;
        chain.push(current.clone());

        match entry.inviter_id() {
            Some(inviter) => current = inviter.clone(),
            None => return Ok(chain),
        }
    }
}

/// Set form of [`ancestor_chain`]
pub fn ancestors(
    member: &MemberId,
    directory: &MemberDirectory,
) -> Result<BTreeSet<MemberId>, TrustGraphError> {
    Ok(ancestor_chain(member, directory)?.into_iter().collect())
}

/// Who `member`'s vote goes to: its inviter, or itself when it is a root
pub fn direct_delegate(
    member: &MemberId,
    directory: &MemberDirectory,
) -> Result<MemberId, TrustGraphError> {
    let chain = ancestor_chain(member, directory)?;
    Ok(chain.get(1).cloned().unwrap_or_else(|| member.clone()))
}

/// Vote tally: each member adds one vote to every id of its ancestor chain.
///
/// Fails on the first broken chain.
pub fn vote_counts(
    directory: &MemberDirectory,
) -> Result<BTreeMap<MemberId, u64>, TrustGraphError> {
    let mut counts: BTreeMap<MemberId, u64> = BTreeMap::new();
    for id in directory.member_ids() {
        for ancestor in ancestor_chain(id, directory)? {
            *counts.entry(ancestor).or_default() += 1;
        }
    }
    Ok(counts)
}

/// Memoized vote tally
///
/// Holds the tally for one directory version. Asking with a directory at a
/// different version recomputes.
#[derive(Debug, Clone, Default)]
pub struct VoteCache {
    version: Option<DirectoryVersion>,
    counts: BTreeMap<MemberId, u64>,
}

impl VoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the cached tally belongs to `directory`'s current version
    pub fn is_fresh(&self, directory: &MemberDirectory) -> bool {
        self.version == Some(directory.version())
    }

    /// Vote tally for `directory`, recomputed if the version changed
    pub fn counts(
        &mut self,
        directory: &MemberDirectory,
    ) -> Result<&BTreeMap<MemberId, u64>, TrustGraphError> {
        if !self.is_fresh(directory) {
            debug!(version = %directory.version(), "recomputing vote tally");
            // clear first so a failed recompute never leaves a stale tally behind
            self.invalidate();
            self.counts = vote_counts(directory)?;
            self.version = Some(directory.version());
        }
        Ok(&self.counts)
    }

    pub fn invalidate(&mut self) {
        self.version = None;
        self.counts.clear();
    }

    /// [`members_sorted_by_votes`] using the cached tally
    pub fn members_sorted_by_votes<'d>(
        &mut self,
        directory: &'d MemberDirectory,
    ) -> Result<Vec<(&'d Member, u64)>, TrustGraphError> {
        let counts = self.counts(directory)?;
        Ok(sort_by_score(directory, |member| {
            counts.get(member.member_id()).copied().unwrap_or_default()
        }))
    }
}

/// Members by number of trusters, highest first
pub fn members_sorted_by_trust(directory: &MemberDirectory) -> Vec<(&Member, u64)> {
    sort_by_score(directory, |member| member.trusted_by().len() as u64)
}

/// Members by number of invitees, highest first
pub fn members_sorted_by_invites(directory: &MemberDirectory) -> Vec<(&Member, u64)> {
    sort_by_score(directory, |member| member.invited().len() as u64)
}

/// Members by vote tally, highest first
pub fn members_sorted_by_votes(
    directory: &MemberDirectory,
) -> Result<Vec<(&Member, u64)>, TrustGraphError> {
    let counts = vote_counts(directory)?;
    Ok(sort_by_score(directory, |member| {
        counts.get(member.member_id()).copied().unwrap_or_default()
    }))
}

/// Stable descending sort; ties keep member id order
fn sort_by_score<'d, F>(directory: &'d MemberDirectory, score: F) -> Vec<(&'d Member, u64)>
where
    F: Fn(&Member) -> u64,
{
    let mut scored: Vec<_> = directory.members().map(|m| (m, score(m))).collect();
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
}
