//! Session store and identity interfaces for the Commons workshop.
//!
//! The realtime document-sync transport and the anonymous-auth backend
//! are external collaborators. This crate pins down their interface --
//! [`SessionStore`] and [`IdentityProvider`] -- and ships deterministic
//! in-process implementations used by unit tests and the runner.
//!
//! The controller never touches a global handle; a store is injected at
//! construction, so every test runs against [`MemorySessionStore`]
//! without a live backend.
//!
//! # Modules
//!
//! - [`error`] -- [`SyncError`] and [`IdentityError`]
//! - [`store`] -- the [`SessionStore`] trait
//! - [`memory`] -- watch-channel-backed in-memory store
//! - [`identity`] -- anonymous identity tokens and provider

pub mod error;
pub mod identity;
pub mod memory;
pub mod store;

pub use error::{IdentityError, SyncError};
pub use identity::{AnonymousIdentity, IdentityProvider, IdentityToken};
pub use memory::MemorySessionStore;
pub use store::SessionStore;
