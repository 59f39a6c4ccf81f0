//! # Hearth Story
//!
//! Turns the operation log into a feed of display-ready stories.
//!
//! Projection runs in two steps. The [`ActivityLog`] groups related
//! operations into activities (a new member's join, verification and
//! referral bonus become one). The [`StoryProjector`] then renders each
//! activity against a [`MemberDirectory`](hearth_ledger::MemberDirectory),
//! bundling basic-income mints that fall in the same time window.
//!
//! Unlike replay, projection is fail-fast: an unknown op code, a missing
//! member or a malformed amount aborts with a
//! [`ProjectionError`](hearth_core::ProjectionError). [`Feed`] runs replay
//! first and keeps the operations it skipped out of projection.
//!
//! ## Key Types
//!
//! - [`ActivityLog`] / [`Activity`]: correlated operations
//! - [`StoryProjector`]: activity to story rendering, with bundling
//! - [`Story`] / [`StoryContent`]: the rendered chain
//! - [`Feed`]: replay, aggregation and projection in one pass
//! - [`ProjectionCache`]: stories memoized by log and directory version
//! - [`StoryConfig`]: bundle window and video location

pub mod activity;
pub mod bundle;
pub mod config;
pub mod feed;
pub mod projector;
pub mod story;

// Re-export main types
pub use activity::*;
pub use bundle::*;
pub use config::*;
pub use feed::*;
pub use projector::*;
pub use story::*;
