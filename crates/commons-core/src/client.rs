//! Snapshot-driven client view and the identity-revocation guard.
//!
//! A client owns no authoritative state: its entire screen is a function
//! of the latest snapshot plus one locally-held team identity. The
//! [`SessionWatcher`] folds the snapshot stream into [`ClientEvent`]s,
//! dropping the held identity the moment the shared roster no longer
//! vouches for it.

use tokio::sync::watch;

use commons_types::{GameSession, SessionStatus, TeamId};

/// What a client renders from the latest snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientView {
    /// No session document exists yet; show the waiting-for-host screen.
    WaitingHost,
    /// The shared session, rendered per its `status` phase.
    Session(GameSession),
}

impl ClientView {
    /// Derive the view from a delivered snapshot.
    pub fn from_snapshot(snapshot: Option<GameSession>) -> Self {
        snapshot.map_or(Self::WaitingHost, Self::Session)
    }
}

/// Whether a held team identity must be dropped for this snapshot.
///
/// Revocation fires only when the session is back in `Setup` and the
/// roster no longer carries the held ID -- the signature of a
/// facilitator reset. A mid-game snapshot never revokes, whatever it
/// contains.
pub fn should_revoke_identity(session: &GameSession, held: TeamId) -> bool {
    session.status == SessionStatus::Setup && !session.contains_team(held)
}

/// One step of a client's event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A new snapshot arrived; render this view.
    Snapshot(ClientView),
    /// The held team identity was revoked by a facilitator reset; the
    /// client returns to the join screen.
    IdentityRevoked,
}

/// Folds the snapshot stream into client events for one participant.
#[derive(Debug)]
pub struct SessionWatcher {
    rx: watch::Receiver<Option<GameSession>>,
    held: Option<TeamId>,
}

impl SessionWatcher {
    /// Watch the snapshot stream, optionally holding a team identity.
    pub const fn new(rx: watch::Receiver<Option<GameSession>>, held: Option<TeamId>) -> Self {
        Self { rx, held }
    }

    /// Record an identity obtained after the watcher was created
    /// (the client joined mid-stream).
    pub const fn hold(&mut self, team: TeamId) {
        self.held = Some(team);
    }

    /// The identity currently held, if any.
    pub const fn held(&self) -> Option<TeamId> {
        self.held
    }

    /// Await the next snapshot and fold it into an event.
    ///
    /// Returns `None` once the store's channel closes and no further
    /// snapshots can arrive. A revoking snapshot yields
    /// [`ClientEvent::IdentityRevoked`] and clears the held identity;
    /// callers render the underlying snapshot via [`Self::current_view`]
    /// when handling the revocation.
    pub async fn next(&mut self) -> Option<ClientEvent> {
        self.rx.changed().await.ok()?;
        let snapshot = self.rx.borrow_and_update().clone();

        if let Some(held) = self.held
            && let Some(session) = snapshot.as_ref()
            && should_revoke_identity(session, held)
        {
            tracing::info!(team = %held, "held identity revoked by session reset");
            self.held = None;
            return Some(ClientEvent::IdentityRevoked);
        }

        Some(ClientEvent::Snapshot(ClientView::from_snapshot(snapshot)))
    }

    /// The view for the current snapshot, without waiting for a change.
    pub fn current_view(&self) -> ClientView {
        ClientView::from_snapshot(self.rx.borrow().clone())
    }
}
