//! Lineage and ranking queries over replayed directories.

use hearth_core::fixtures::*;
use hearth_core::{MemberId, Operation};
use hearth_ledger::{
    ancestor_chain, ancestors, direct_delegate, members_sorted_by_invites, members_sorted_by_trust,
    members_sorted_by_votes, vote_counts, Inviter, LedgerConfig, MemberDirectory, ReplayEngine,
    VoteCache,
};

fn engine() -> ReplayEngine {
    ReplayEngine::new(LedgerConfig::empty().with_genesis_request_invite_ops(["g-alice", "g-zed"]))
}

fn id(raw: &str) -> MemberId {
    MemberId::from(raw)
}

/// alice (genesis) -> bob -> {carol, dave}; carol -> erin; zed (genesis)
fn family_log() -> Vec<Operation> {
    vec![
        genesis_invite("g-alice", "alice", "alice", at_hours(0)),
        genesis_invite("g-zed", "zed", "zed", at_hours(0)),
        request_invite("op-1", "bob", "alice", "bob", at_hours(1)),
        request_invite("op-2", "carol", "bob", "carol", at_hours(2)),
        request_invite("op-3", "dave", "bob", "dave", at_hours(3)),
        request_invite("op-4", "erin", "carol", "erin", at_hours(4)),
        trust("op-5", "zed", "carol", at_hours(5)),
        trust("op-6", "alice", "carol", at_hours(6)),
    ]
}

fn family() -> MemberDirectory {
    engine().replay(&family_log())
}

#[test]
fn every_chain_ends_at_a_genesis_member() {
    let dir = family();
    for member in dir.members() {
        let chain = ancestor_chain(member.member_id(), &dir).unwrap();
        assert!(chain.len() <= dir.len());
        assert_eq!(chain.first(), Some(member.member_id()));
        let root = dir.get(chain.last().unwrap()).unwrap();
        assert_eq!(root.invited_by(), Some(&Inviter::Genesis));
    }
}

#[test]
fn ancestors_of_erin() {
    let dir = family();
    let set = ancestors(&id("erin"), &dir).unwrap();
    let expected: Vec<_> = ["alice", "bob", "carol", "erin"].iter().map(|s| id(s)).collect();
    assert_eq!(set.into_iter().collect::<Vec<_>>(), expected);
    assert_eq!(direct_delegate(&id("erin"), &dir).unwrap(), id("carol"));
}

#[test]
fn vote_tally_counts_subtrees() {
    let dir = family();
    let counts = vote_counts(&dir).unwrap();
    assert_eq!(counts[&id("alice")], 5);
    assert_eq!(counts[&id("bob")], 4);
    assert_eq!(counts[&id("carol")], 2);
    assert_eq!(counts[&id("dave")], 1);
    assert_eq!(counts[&id("erin")], 1);
    assert_eq!(counts[&id("zed")], 1);
}

#[test]
fn sorted_views() {
    let dir = family();

    let by_trust: Vec<_> = members_sorted_by_trust(&dir)
        .into_iter()
        .map(|(m, score)| (m.member_id().as_str(), score))
        .collect();
    // carol: erin (invite), zed, alice; bob: carol, dave; ties keep id order
    assert_eq!(by_trust[0], ("carol", 3));
    assert_eq!(by_trust[1], ("bob", 2));
    assert_eq!(by_trust[2], ("alice", 1));

    let by_invites: Vec<_> = members_sorted_by_invites(&dir)
        .into_iter()
        .map(|(m, score)| (m.member_id().as_str(), score))
        .collect();
    assert_eq!(by_invites[0], ("bob", 2));
    assert_eq!(by_invites[1], ("alice", 1));
    assert_eq!(by_invites[2], ("carol", 1));

    let by_votes: Vec<_> = members_sorted_by_votes(&dir)
        .unwrap()
        .into_iter()
        .map(|(m, score)| (m.member_id().as_str(), score))
        .collect();
    assert_eq!(
        by_votes,
        vec![
            ("alice", 5),
            ("bob", 4),
            ("carol", 2),
            ("dave", 1),
            ("erin", 1),
            ("zed", 1)
        ]
    );
}

#[test]
fn vote_cache_follows_directory_version() {
    let engine = engine();
    let ops = family_log();
    let mut dir = engine.replay(&ops[..4]);
    let mut cache = VoteCache::new();

    assert_eq!(cache.counts(&dir).unwrap()[&id("alice")], 3);
    assert!(cache.is_fresh(&dir));

    engine.extend_with_report(&mut dir, &ops[4..]);
    assert!(!cache.is_fresh(&dir));
    assert_eq!(cache.counts(&dir).unwrap()[&id("alice")], 5);

    // a rejected operation does not change the version, so the tally stays fresh
    engine.extend_with_report(&mut dir, &[trust("op-bad", "alice", "ghost", at_hours(9))]);
    assert!(cache.is_fresh(&dir));

    cache.invalidate();
    assert!(!cache.is_fresh(&dir));
    let sorted = cache.members_sorted_by_votes(&dir).unwrap();
    assert_eq!(sorted[0].0.member_id(), &id("alice"));
}

#[test]
fn uninvited_member_is_its_own_root() {
    let dir = engine().replay(&[create_member("op-1", "solo", None, "solo", at_hours(0))]);
    assert_eq!(ancestor_chain(&id("solo"), &dir).unwrap(), vec![id("solo")]);
    assert_eq!(direct_delegate(&id("solo"), &dir).unwrap(), id("solo"));
}
