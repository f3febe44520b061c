//! The scripted facilitator seat.
//!
//! Drives the whole session from its snapshot stream: create the
//! document, start once the expected roster has assembled, settle each
//! round the moment every team is ready, advance off the reveal, and
//! report standings at the end. Rejections on stale snapshots are
//! tolerated; the next snapshot re-evaluates.

use std::sync::Arc;

use commons_core::{ControllerError, SessionConfig, SessionController, all_ready};
use commons_sync::{AnonymousIdentity, IdentityProvider, MemorySessionStore, SessionStore};
use commons_types::{GameSession, SessionStatus};

use crate::error::RunnerError;

/// Swallow boundary rejections; a stale snapshot is not a failure.
fn tolerate(result: Result<(), ControllerError>) -> Result<(), RunnerError> {
    match result {
        Ok(()) => Ok(()),
        Err(ControllerError::Rejected(reason)) => {
            tracing::debug!(?reason, "facilitator action rejected on a stale snapshot");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn log_reveal(session: &GameSession) {
    let Some(result) = session.round_result.as_ref() else {
        return;
    };
    tracing::info!(
        round = session.current_round,
        total_invested = result.total_invested,
        multiplied_fund = result.multiplied_fund,
        payout_per_team = %result.payout_per_team.round_dp(1),
        "round revealed"
    );
}

fn log_standings(session: &GameSession) {
    for (rank, team) in session.standings().iter().enumerate() {
        tracing::info!(
            rank = rank.saturating_add(1),
            name = team.name,
            score = %team.score.round_dp(1),
            "final standing"
        );
    }
}

/// Run the facilitator seat until the session ends.
///
/// # Errors
///
/// Returns [`RunnerError`] if the store fails or the snapshot stream
/// closes before the session ends.
pub async fn run_facilitator(
    store: Arc<MemorySessionStore>,
    config: SessionConfig,
    roster_size: usize,
) -> Result<(), RunnerError> {
    let controller = SessionController::new(Arc::clone(&store), config).await?;
    let identity = AnonymousIdentity.sign_in().await?;
    tracing::debug!(%identity, "facilitator signed in");

    let mut rx = store.subscribe().await?;
    controller.create_or_reset().await?;

    loop {
        let snapshot = rx.borrow_and_update().clone();
        if let Some(session) = snapshot {
            match session.status {
                SessionStatus::Setup if session.teams.len() >= roster_size => {
                    tracing::info!(teams = session.teams.len(), "roster complete, starting");
                    tolerate(controller.start().await)?;
                }
                SessionStatus::Playing if all_ready(&session) => {
                    tolerate(controller.settle_round().await)?;
                }
                SessionStatus::Reveal => {
                    log_reveal(&session);
                    tolerate(controller.advance_round().await)?;
                }
                SessionStatus::End => {
                    log_standings(&session);
                    return Ok(());
                }
                SessionStatus::Setup | SessionStatus::Playing => {}
            }
        }

        if rx.changed().await.is_err() {
            return Err(RunnerError::TaskAborted(
                "facilitator snapshot stream closed".into(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::team::{demo_roster, run_team};

    #[tokio::test]
    async fn scripted_session_runs_to_completion() -> Result<(), RunnerError> {
        let store = Arc::new(MemorySessionStore::new());
        let config = SessionConfig::default();
        let roster = demo_roster();

        let facilitator = tokio::spawn(run_facilitator(
            Arc::clone(&store),
            config.clone(),
            roster.len(),
        ));
        let mut teams = Vec::new();
        for script in roster {
            teams.push(tokio::spawn(run_team(
                Arc::clone(&store),
                config.clone(),
                script,
            )));
        }

        let done = tokio::time::timeout(Duration::from_secs(5), facilitator)
            .await
            .map_err(|_| RunnerError::TaskAborted("facilitator timed out".into()))?
            .map_err(|err| RunnerError::TaskAborted(err.to_string()))?;
        done?;

        let session = store.current().unwrap_or_default();
        assert_eq!(session.status, SessionStatus::End);
        assert_eq!(session.history.len(), 5);
        let totals: Vec<u32> = session.history.iter().map(|h| h.total_invested).collect();
        assert_eq!(totals, vec![15, 17, 19, 25, 30]);

        // Keeping tokens back never hurts: the holdout leads, the full
        // cooperator trails.
        let standings = session.standings();
        let names: Vec<&str> = standings.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Quarry", "Meadow", "Harbor"]);

        for handle in teams {
            let finished = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .map_err(|_| RunnerError::TaskAborted("team timed out".into()))?
                .map_err(|err| RunnerError::TaskAborted(err.to_string()))?;
            finished?;
        }
        Ok(())
    }
}
