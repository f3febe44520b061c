//! The [`SessionStore`] trait: the controller's only door to the shared
//! document.
//!
//! A store holds exactly one `GameSession` document (the single global
//! room, [`SESSION_DOC_ID`]). Snapshots are pushed to every subscriber
//! on every change, the writer included; there is no ordering guarantee
//! between independent writers beyond eventual delivery.
//!
//! [`SESSION_DOC_ID`]: commons_types::SESSION_DOC_ID

use async_trait::async_trait;
use tokio::sync::watch;

use commons_types::{GameSession, PatchOp};

use crate::error::SyncError;

/// Subscribe/create/merge/replace access to the shared session document.
///
/// `None` in a delivered snapshot means the document does not exist
/// (the client-side "waiting host" condition).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Open a push-based snapshot subscription.
    ///
    /// The receiver's current value is the latest snapshot at the time
    /// of the call; every subsequent change is delivered, including the
    /// subscriber's own writes echoed back.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the store can no longer deliver.
    async fn subscribe(&self) -> Result<watch::Receiver<Option<GameSession>>, SyncError>;

    /// Establish the document if absent. A no-op when it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the write fails.
    async fn create(&self, initial: GameSession) -> Result<(), SyncError>;

    /// Merge the given field-path operations into the existing document
    /// without disturbing untouched fields.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::NotFound`] if no document exists, or another
    /// [`SyncError`] if the write fails.
    async fn write_merge(&self, ops: &[PatchOp]) -> Result<(), SyncError>;

    /// Overwrite the document wholesale. Establishes it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] if the write fails.
    async fn replace(&self, session: GameSession) -> Result<(), SyncError>;
}
