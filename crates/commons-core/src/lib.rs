//! Session state machine and round-settlement engine for the Commons
//! workshop.
//!
//! This crate owns every mutation of the shared `GameSession` document:
//! the [`SessionController`] validates each operation against the latest
//! snapshot, computes the resulting field-path merge, and pushes it
//! through an injected [`SessionStore`]. All connected clients -- the
//! originating one included -- re-derive their view from the echoed
//! snapshot; nothing here is client-local authoritative state.
//!
//! # Modules
//!
//! - [`config`] -- session parameters with YAML loading
//! - [`settlement`] -- the pure payoff computation
//! - [`readiness`] -- the all-teams-submitted guard
//! - [`controller`] -- state-machine transitions over a session store
//! - [`client`] -- snapshot-driven client view and identity revocation
//!
//! [`SessionController`]: controller::SessionController
//! [`SessionStore`]: commons_sync::SessionStore

pub mod client;
pub mod config;
pub mod controller;
pub mod readiness;
pub mod settlement;

pub use client::{ClientEvent, ClientView, SessionWatcher, should_revoke_identity};
pub use config::{ConfigError, SessionConfig};
pub use controller::{ControllerError, SessionController, clamp_investment};
pub use readiness::all_ready;
pub use settlement::{Settlement, round_multiplier, settle};
