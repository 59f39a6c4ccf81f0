//! # Hearth Core
//!
//! Core types and errors shared by the Hearth ledger engine.
//!
//! The engine consumes an append-only, chronologically ordered log of
//! [`Operation`]s and derives two things from it:
//!
//! - a member directory with identity, trust and balance state (`hearth-ledger`)
//! - a display-ready story feed (`hearth-story`)
//!
//! This crate holds the pieces both sides agree on.
//!
//! ## Key Types
//!
//! - [`MemberId`], [`OperationId`]: identifier newtypes
//! - [`Operation`] / [`OperationPayload`]: one record of the log, one variant per op code
//! - [`MintType`]: basic income vs referral bonus mints
//! - [`HearthError`] and the per-concern error enums

pub mod amount;
pub mod error;
pub mod fixtures;
pub mod ids;
pub mod operation;

// Re-export main types
pub use amount::*;
pub use error::*;
pub use ids::*;
pub use operation::*;
