//! Scripted team clients.
//!
//! Each team runs as its own task with its own controller, identity,
//! and snapshot watcher -- the same seat a real participant's browser
//! would occupy. Decisions are read from a per-round script; raw values
//! deliberately include out-of-range and fractional entries to exercise
//! the clamping boundary.

use std::sync::Arc;

use commons_core::{
    ClientEvent, ClientView, ControllerError, SessionConfig, SessionController, SessionWatcher,
};
use commons_sync::{AnonymousIdentity, IdentityProvider, MemorySessionStore, SessionStore};
use commons_types::SessionStatus;

use crate::error::RunnerError;

/// A team's name and its raw decision per round.
#[derive(Debug, Clone)]
pub struct TeamScript {
    /// Display name submitted at join.
    pub name: String,
    /// Raw decision input per round, pre-clamp.
    pub decisions: Vec<f64>,
}

/// The built-in demo roster: a full cooperator, a hedger, and a
/// late-converting free rider whose script strays outside the budget.
pub fn demo_roster() -> Vec<TeamScript> {
    vec![
        TeamScript {
            name: "Harbor".into(),
            decisions: vec![10.0, 10.0, 10.0, 10.0, 10.0],
        },
        TeamScript {
            name: "Meadow".into(),
            decisions: vec![5.0, 5.0, 5.0, 5.0, 10.0],
        },
        TeamScript {
            name: "Quarry".into(),
            decisions: vec![0.0, 2.4, 3.7, 12.0, 10.0],
        },
    ]
}

/// Run one scripted team from sign-in to session end.
///
/// The task joins as soon as the shared document reaches `Setup`,
/// submits its scripted decision whenever its readiness flag is clear
/// during `Playing`, and exits on `End` or on identity revocation.
///
/// # Errors
///
/// Returns [`RunnerError`] if the store fails or the snapshot stream
/// closes before the session ends.
pub async fn run_team(
    store: Arc<MemorySessionStore>,
    config: SessionConfig,
    script: TeamScript,
) -> Result<(), RunnerError> {
    let controller = SessionController::new(Arc::clone(&store), config).await?;
    let identity = AnonymousIdentity.sign_in().await?;
    tracing::debug!(%identity, name = script.name, "team client signed in");

    let mut watcher = SessionWatcher::new(store.subscribe().await?, None);

    // Wait for a joinable document.
    loop {
        if let ClientView::Session(session) = watcher.current_view()
            && session.status == SessionStatus::Setup
        {
            break;
        }
        if watcher.next().await.is_none() {
            return Err(RunnerError::TaskAborted(format!(
                "{}: stream closed before setup",
                script.name,
            )));
        }
    }

    let id = match controller.join(&script.name).await {
        Ok(id) => id,
        Err(ControllerError::Rejected(reason)) => {
            return Err(RunnerError::TaskAborted(format!(
                "{}: join rejected: {reason:?}",
                script.name,
            )));
        }
        Err(err) => return Err(err.into()),
    };
    watcher.hold(id);
    tracing::info!(team = %id, name = script.name, "joined roster");

    while let Some(event) = watcher.next().await {
        let session = match event {
            ClientEvent::IdentityRevoked => {
                tracing::info!(name = script.name, "identity revoked, leaving");
                return Ok(());
            }
            ClientEvent::Snapshot(ClientView::WaitingHost) => continue,
            ClientEvent::Snapshot(ClientView::Session(session)) => session,
        };

        match session.status {
            SessionStatus::Playing => {
                let submitted = session.input_status.get(&id).copied().unwrap_or(false);
                if submitted {
                    continue;
                }
                // The script is indexed by the shared round counter, so a
                // coalesced snapshot stream can never desynchronize it.
                let raw = usize::try_from(session.current_round.saturating_sub(1))
                    .ok()
                    .and_then(|i| script.decisions.get(i).copied());
                let Some(raw) = raw else { continue };
                match controller.submit_decision(id, raw).await {
                    Ok(()) => {
                        tracing::debug!(name = script.name, raw, "decision submitted");
                    }
                    Err(ControllerError::Rejected(reason)) => {
                        tracing::debug!(
                            name = script.name,
                            ?reason,
                            "submission rejected on a stale snapshot"
                        );
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            SessionStatus::End => {
                let score = session.team(id).map(|t| t.score.round_dp(1));
                tracing::info!(name = script.name, score = ?score, "session over");
                return Ok(());
            }
            SessionStatus::Setup | SessionStatus::Reveal => {}
        }
    }

    Err(RunnerError::TaskAborted(format!(
        "{}: stream closed mid-session",
        script.name,
    )))
}
