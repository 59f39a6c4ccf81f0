//! # Hearth Ledger
//!
//! Derives member state from the operation log.
//!
//! The [`ReplayEngine`] folds operations into a [`MemberDirectory`]. The
//! fold is resilient: an operation that references a missing member or
//! carries a malformed amount is logged and skipped, and replay carries on
//! with the state it had before. The trust graph functions then answer
//! lineage and ranking queries over the directory.
//!
//! ## Key Types
//!
//! - [`ReplayEngine`]: full and incremental replay, with [`ReplayReport`]s
//! - [`MemberDirectory`] / [`Member`]: the derived state
//! - [`DirectoryVersion`]: hash-chained revision used as a cache key
//! - [`VoteCache`]: memoized vote tally
//! - [`LedgerConfig`]: genesis operation ids
//!
//! ## Example
//!
//! ```
//! use hearth_core::fixtures::{genesis_invite, mint_basic_income, at_hours};
//! use hearth_core::MemberId;
//! use hearth_ledger::{LedgerConfig, ReplayEngine};
//!
//! let engine = ReplayEngine::new(LedgerConfig::empty().with_genesis_request_invite_ops(["g1"]));
//! let ops = vec![
//!     genesis_invite("g1", "alice", "alice", at_hours(0)),
//!     mint_basic_income("m1", "alice", "10", at_hours(1)),
//! ];
//! let directory = engine.replay(&ops);
//! let alice = directory.get(&MemberId::from("alice")).unwrap();
//! assert_eq!(alice.balance().to_string(), "10");
//! ```

pub mod config;
pub mod directory;
pub mod member;
pub mod replay;
pub mod trust_graph;

// Re-export main types
pub use config::*;
pub use directory::*;
pub use member::*;
pub use replay::*;
pub use trust_graph::*;
