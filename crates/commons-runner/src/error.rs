//! Runner error type.

use commons_core::ControllerError;
use commons_sync::{IdentityError, SyncError};

/// Errors that can abort the scripted session.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A controller operation failed beyond the tolerated rejections.
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// The session store failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// No anonymous identity could be obtained.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A scripted task ended before the session did.
    #[error("scripted task aborted: {0}")]
    TaskAborted(String),
}
