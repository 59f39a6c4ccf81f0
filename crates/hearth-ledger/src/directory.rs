//! Member directory
//!
//! Two indices over one member set: by id and by username. The directory
//! also carries a [`DirectoryVersion`] that advances with every applied
//! operation, which is what downstream caches key on.

use std::collections::BTreeMap;
use std::fmt;

use hearth_core::{MemberId, OperationId};
use serde::{Deserialize, Serialize};

use crate::member::Member;

/// Revision of a [`MemberDirectory`]
///
/// `digest` is a blake3 hash chain over the ids of every applied operation,
/// so equal versions mean equal histories regardless of whether the
/// directory was rebuilt in one pass or extended in batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectoryVersion {
    applied: u64,
    digest: [u8; 32],
}

impl DirectoryVersion {
    /// Version of an empty directory
    pub fn initial() -> Self {
        Self {
            applied: 0,
            digest: [0u8; 32],
        }
    }

    /// Number of operations applied so far
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }

    pub(crate) fn advance(&self, operation_id: &OperationId) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.digest);
        hasher.update(operation_id.as_bytes());
        Self {
            applied: self.applied + 1,
            digest: *hasher.finalize().as_bytes(),
        }
    }
}

impl Default for DirectoryVersion {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for DirectoryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.applied, hex::encode(&self.digest[..8]))
    }
}

/// Queryable set of all members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDirectory {
    by_id: BTreeMap<MemberId, Member>,
    by_username: BTreeMap<String, MemberId>,
    version: DirectoryVersion,
}

impl MemberDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &MemberId) -> Option<&Member> {
        self.by_id.get(id)
    }

    pub fn get_by_username(&self, username: &str) -> Option<&Member> {
        self.by_username.get(username).and_then(|id| self.by_id.get(id))
    }

    pub fn contains(&self, id: &MemberId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Members in id order
    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.by_id.values()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &MemberId> {
        self.by_id.keys()
    }

    pub fn version(&self) -> DirectoryVersion {
        self.version
    }

    pub(crate) fn get_mut(&mut self, id: &MemberId) -> Option<&mut Member> {
        self.by_id.get_mut(id)
    }

    /// Insert a member the caller has already checked is new
    pub(crate) fn insert(&mut self, member: Member) {
        self.by_username
            .insert(member.username.clone(), member.member_id.clone());
        self.by_id.insert(member.member_id.clone(), member);
    }

    /// Move `id` to `username`. The caller has checked the name is free.
    pub(crate) fn rename(&mut self, id: &MemberId, username: String) {
        if let Some(member) = self.by_id.get_mut(id) {
            self.by_username.remove(&member.username);
            self.by_username.insert(username.clone(), id.clone());
            member.username = username;
        }
    }

    pub(crate) fn record_applied(&mut self, operation_id: &OperationId) {
        self.version = self.version.advance(operation_id);
    }
}
