//! Anonymous identity tokens and the provider interface.
//!
//! Clients must hold an identity token before any [`SessionStore`] call.
//! The token is opaque and per-browser-session; it carries no authority
//! (any client can claim any team -- anti-cheat is a non-goal) and only
//! exists so the transport can attribute writes.
//!
//! [`SessionStore`]: crate::store::SessionStore

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::IdentityError;

/// An opaque anonymous identity issued for one client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityToken(Uuid);

impl IdentityToken {
    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl core::fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The anonymous-auth collaborator, reduced to its interface.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Obtain an anonymous identity for this client session.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] when no token can be issued. Callers
    /// must treat this as fatal and surface it immediately; no retry
    /// loop is attempted.
    async fn sign_in(&self) -> Result<IdentityToken, IdentityError>;
}

/// In-process identity provider issuing fresh UUID v7 tokens.
///
/// Stands in for the real anonymous-auth backend in tests and the
/// scripted runner.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn sign_in(&self) -> Result<IdentityToken, IdentityError> {
        let token = IdentityToken(Uuid::now_v7());
        tracing::debug!(%token, "anonymous identity issued");
        Ok(token)
    }
}
