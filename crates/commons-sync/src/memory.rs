//! Watch-channel-backed in-memory session store.
//!
//! [`MemorySessionStore`] is the deterministic [`SessionStore`] used by
//! unit tests and the scripted runner. A [`watch`] channel holds the
//! single document; `send_modify` mutates it in place and notifies every
//! subscriber, so writers see their own writes echoed back exactly like
//! a remote store would deliver them.

use async_trait::async_trait;
use tokio::sync::watch;

use commons_types::{GameSession, PatchOp, SESSION_DOC_ID};

use crate::error::SyncError;
use crate::store::SessionStore;

/// In-process store holding the single session document.
#[derive(Debug)]
pub struct MemorySessionStore {
    tx: watch::Sender<Option<GameSession>>,
}

impl MemorySessionStore {
    /// Create an empty store: no document exists until `create` or
    /// `replace` establishes one.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// The latest snapshot, if a document exists.
    pub fn current(&self) -> Option<GameSession> {
        self.tx.borrow().clone()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn subscribe(&self) -> Result<watch::Receiver<Option<GameSession>>, SyncError> {
        Ok(self.tx.subscribe())
    }

    async fn create(&self, initial: GameSession) -> Result<(), SyncError> {
        let mut established = false;
        self.tx.send_modify(|doc| {
            if doc.is_none() {
                *doc = Some(initial);
                established = true;
            }
        });
        if established {
            tracing::info!(doc = SESSION_DOC_ID, "session document created");
        }
        Ok(())
    }

    async fn write_merge(&self, ops: &[PatchOp]) -> Result<(), SyncError> {
        let mut found = false;
        self.tx.send_modify(|doc| {
            if let Some(session) = doc.as_mut() {
                session.apply_all(ops);
                found = true;
            }
        });
        if found {
            tracing::debug!(ops = ops.len(), "merged field paths into session");
            Ok(())
        } else {
            Err(SyncError::NotFound)
        }
    }

    async fn replace(&self, session: GameSession) -> Result<(), SyncError> {
        self.tx.send_replace(Some(session));
        tracing::debug!(doc = SESSION_DOC_ID, "session document replaced");
        Ok(())
    }
}
