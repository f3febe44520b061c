//! Shared type definitions for the Commons workshop session.
//!
//! This crate is the single source of truth for the shared `GameSession`
//! document and everything serialized into it. Types defined here flow
//! downstream to `TypeScript` via `ts-rs` for the facilitator and team UIs.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for team identifiers
//! - [`enums`] -- Session phase and operation rejection reasons
//! - [`session`] -- The `GameSession` aggregate, teams, results, history
//! - [`patch`] -- Typed field-path merge operations on the aggregate

pub mod enums;
pub mod ids;
pub mod patch;
pub mod session;

// Re-export all public types at crate root for convenience.
pub use enums::{RejectionReason, SessionStatus};
pub use ids::TeamId;
pub use patch::PatchOp;
pub use session::{
    GameSession, HistoryEntry, InvariantViolation, RoundDetail, RoundResult, Team, INITIAL_TOKENS,
    SESSION_DOC_ID, TEAM_COLORS, TOTAL_ROUNDS, palette_color,
};
