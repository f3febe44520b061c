//! Error types for the sync boundary.
//!
//! Read-side failures leave a client on its last known snapshot; write
//! failures bubble to the controller, which retries once with a full
//! replace before surfacing them. Neither path may corrupt the shared
//! document.

/// Errors that can occur talking to the session store.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No session document exists where one was required.
    #[error("session document not found")]
    NotFound,

    /// The store's subscription channel is closed; no further
    /// snapshots will be delivered.
    #[error("session store closed")]
    Closed,

    /// A backend-specific failure, carried as text.
    #[error("sync backend error: {0}")]
    Backend(String),
}

/// The anonymous identity collaborator could not issue a token.
///
/// Fatal and user-visible: no store call is permitted without a token,
/// and no retry loop is specified beyond the initial attempt.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The identity backend refused or failed to sign in.
    #[error("could not obtain anonymous identity: {0}")]
    SignInFailed(String),
}
