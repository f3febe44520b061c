//! State-machine transitions over an injected session store.
//!
//! The [`SessionController`] is the only writer of structured
//! transitions: create/reset, join, start, settle, advance. Each
//! operation validates against the latest echoed snapshot, builds the
//! typed merge, and pushes it through the store. A rejected operation
//! writes nothing.
//!
//! Writes that fail at the merge level are retried once as a full
//! document replace built from the latest snapshot. A lost race between
//! two facilitator writes resolves by last-write-wins, which a
//! supervised five-round session tolerates.

use std::sync::Arc;

use tokio::sync::watch;

use commons_sync::{SessionStore, SyncError};
use commons_types::{
    GameSession, PatchOp, RejectionReason, SessionStatus, Team, TeamId, palette_color,
};

use crate::config::SessionConfig;
use crate::readiness::all_ready;
use crate::settlement::settle;

/// Errors surfaced by controller operations.
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The operation was rejected at the boundary; nothing was written.
    #[error("operation rejected: {0:?}")]
    Rejected(RejectionReason),

    /// The store could not complete the write.
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Clamp a raw decision input to the per-round token budget.
///
/// Non-finite input reads as zero. The value is rounded half-away-from-
/// zero, then bounded to `0..=budget`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn clamp_investment(raw: f64, budget: u32) -> u32 {
    if !raw.is_finite() {
        return 0;
    }
    let rounded = raw.round();
    if rounded <= 0.0 {
        return 0;
    }
    if rounded >= f64::from(budget) {
        return budget;
    }
    // In-range by the bounds checks above.
    rounded as u32
}

/// Validates and applies every structured transition of the session.
#[derive(Debug)]
pub struct SessionController<S> {
    store: Arc<S>,
    rx: watch::Receiver<Option<GameSession>>,
    config: SessionConfig,
}

impl<S: SessionStore> SessionController<S> {
    /// Attach a controller to a store, subscribing to its snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the store cannot deliver
    /// snapshots.
    pub async fn new(store: Arc<S>, config: SessionConfig) -> Result<Self, SyncError> {
        let rx = store.subscribe().await?;
        Ok(Self { store, rx, config })
    }

    /// The latest echoed snapshot, if a document exists.
    pub fn current(&self) -> Option<GameSession> {
        self.rx.borrow().clone()
    }

    /// The session configuration this controller validates against.
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Facilitator operations
    // -----------------------------------------------------------------------

    /// Establish the document if absent, or reset it to the canonical
    /// default state. Reachable from every phase.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Sync`] if the write fails.
    pub async fn create_or_reset(&self) -> Result<(), ControllerError> {
        if self.current().is_none() {
            tracing::info!("establishing session document");
            self.store.create(GameSession::default()).await?;
        } else {
            tracing::info!("resetting session to canonical default");
            self.store.replace(GameSession::default()).await?;
        }
        Ok(())
    }

    /// Open round one: freeze the roster and move to `Playing`.
    ///
    /// Clears both decision maps to the canonical contract (every
    /// rostered team at `0` / not ready) and clears any stale round
    /// result.
    ///
    /// # Errors
    ///
    /// Rejected with [`RejectionReason::NotInSetup`] outside `Setup` and
    /// [`RejectionReason::EmptyRoster`] when no team has joined.
    pub async fn start(&self) -> Result<(), ControllerError> {
        let session = self.require_session()?;
        if session.status != SessionStatus::Setup {
            return Err(ControllerError::Rejected(RejectionReason::NotInSetup));
        }
        if session.teams.is_empty() {
            return Err(ControllerError::Rejected(RejectionReason::EmptyRoster));
        }

        tracing::info!(teams = session.teams.len(), "starting session");
        self.write_with_fallback(&[
            PatchOp::SetStatus(SessionStatus::Playing),
            PatchOp::SetCurrentRound(1),
            PatchOp::ResetDecisions,
            PatchOp::SetRoundResult(None),
        ])
        .await
    }

    /// Settle the current round once every team has submitted.
    ///
    /// Writes the updated roster, the round result, the history entry,
    /// and the `Reveal` phase in one merge.
    ///
    /// # Errors
    ///
    /// Rejected with [`RejectionReason::NotPlaying`] outside `Playing`,
    /// [`RejectionReason::EmptyRoster`] on an empty roster, and
    /// [`RejectionReason::NotReady`] while any team is pending.
    pub async fn settle_round(&self) -> Result<(), ControllerError> {
        let session = self.require_session()?;
        if session.status != SessionStatus::Playing {
            return Err(ControllerError::Rejected(RejectionReason::NotPlaying));
        }
        if session.teams.is_empty() {
            return Err(ControllerError::Rejected(RejectionReason::EmptyRoster));
        }
        if !all_ready(&session) {
            return Err(ControllerError::Rejected(RejectionReason::NotReady));
        }

        let settled = settle(&session, &self.config);
        tracing::info!(
            round = session.current_round,
            total_invested = settled.round_result.total_invested,
            multiplied_fund = settled.round_result.multiplied_fund,
            "settling round"
        );
        self.write_with_fallback(&[
            PatchOp::SetTeams(settled.updated_teams),
            PatchOp::SetRoundResult(Some(settled.round_result)),
            PatchOp::AppendHistory(settled.history_entry),
            PatchOp::SetStatus(SessionStatus::Reveal),
        ])
        .await
    }

    /// Leave the reveal screen: open the next round, or end the session
    /// after the final round.
    ///
    /// # Errors
    ///
    /// Rejected with [`RejectionReason::NotInReveal`] outside `Reveal`.
    pub async fn advance_round(&self) -> Result<(), ControllerError> {
        let session = self.require_session()?;
        if session.status != SessionStatus::Reveal {
            return Err(ControllerError::Rejected(RejectionReason::NotInReveal));
        }

        if session.current_round >= self.config.total_rounds {
            tracing::info!("final round revealed, ending session");
            return self
                .write_with_fallback(&[PatchOp::SetStatus(SessionStatus::End)])
                .await;
        }

        let next = session.current_round.saturating_add(1);
        tracing::info!(round = next, "advancing to next round");
        self.write_with_fallback(&[
            PatchOp::SetCurrentRound(next),
            PatchOp::SetStatus(SessionStatus::Playing),
            PatchOp::ResetDecisions,
            PatchOp::SetRoundResult(None),
        ])
        .await
    }

    // -----------------------------------------------------------------------
    // Team operations
    // -----------------------------------------------------------------------

    /// Register a team during setup, returning its assigned identity.
    ///
    /// The name is trimmed; its color comes from the palette at the
    /// team's roster position.
    ///
    /// # Errors
    ///
    /// Rejected with [`RejectionReason::NotInSetup`] outside `Setup`,
    /// [`RejectionReason::EmptyName`] for a blank name, and
    /// [`RejectionReason::NameTooLong`] past the configured bound.
    pub async fn join(&self, name: &str) -> Result<TeamId, ControllerError> {
        let session = self.require_session()?;
        if session.status != SessionStatus::Setup {
            return Err(ControllerError::Rejected(RejectionReason::NotInSetup));
        }

        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ControllerError::Rejected(RejectionReason::EmptyName));
        }
        if trimmed.chars().count() > self.config.max_team_name_len {
            return Err(ControllerError::Rejected(RejectionReason::NameTooLong));
        }

        let team = Team::new(trimmed, palette_color(session.teams.len()));
        let id = team.id;
        tracing::info!(team = %id, name = trimmed, color = team.color, "team joined");
        self.write_with_fallback(&[PatchOp::AppendTeam(team)])
            .await?;
        Ok(id)
    }

    /// Record a team's decision for the current round.
    ///
    /// The raw input is clamped to `0..=initial_tokens`; resubmission
    /// before settlement overwrites the previous value.
    ///
    /// # Errors
    ///
    /// Rejected with [`RejectionReason::NotPlaying`] outside `Playing`
    /// and [`RejectionReason::UnknownTeam`] for an unrostered ID.
    pub async fn submit_decision(&self, team: TeamId, raw: f64) -> Result<(), ControllerError> {
        let session = self.require_session()?;
        if session.status != SessionStatus::Playing {
            return Err(ControllerError::Rejected(RejectionReason::NotPlaying));
        }
        if !session.contains_team(team) {
            return Err(ControllerError::Rejected(RejectionReason::UnknownTeam));
        }

        let invested = clamp_investment(raw, self.config.initial_tokens);
        tracing::debug!(team = %team, invested, "decision submitted");
        self.write_with_fallback(&[PatchOp::SetDecision { team, invested }])
            .await
    }

    // -----------------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------------

    fn require_session(&self) -> Result<GameSession, ControllerError> {
        self.current()
            .ok_or(ControllerError::Rejected(RejectionReason::NoSession))
    }

    /// Merge the ops; on failure, retry once as a full replace built from
    /// the latest snapshot with the same ops applied.
    async fn write_with_fallback(&self, ops: &[PatchOp]) -> Result<(), ControllerError> {
        if let Err(err) = self.store.write_merge(ops).await {
            tracing::warn!(error = %err, "merge write failed, retrying as replace");
            let Some(mut merged) = self.current() else {
                return Err(err.into());
            };
            merged.apply_all(ops);
            self.store.replace(merged).await?;
        }

        if let Some(session) = self.current()
            && let Err(violation) =
                session.verify_invariants(self.config.total_rounds, self.config.initial_tokens)
        {
            tracing::warn!(%violation, "session invariant violated after write");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use commons_sync::MemorySessionStore;
    use rust_decimal::Decimal;

    async fn controller_with_session()
    -> Result<SessionController<MemorySessionStore>, ControllerError> {
        let store = Arc::new(MemorySessionStore::new());
        let controller = SessionController::new(store, SessionConfig::default()).await?;
        controller.create_or_reset().await?;
        Ok(controller)
    }

    /// Drive a full round: every team invests its scripted amount, then
    /// the facilitator settles.
    async fn play_round(
        controller: &SessionController<MemorySessionStore>,
        decisions: &[(TeamId, f64)],
    ) -> Result<(), ControllerError> {
        for (team, raw) in decisions {
            controller.submit_decision(*team, *raw).await?;
        }
        controller.settle_round().await
    }

    #[test]
    fn clamp_rounds_and_bounds() {
        assert_eq!(clamp_investment(7.4, 10), 7);
        assert_eq!(clamp_investment(7.5, 10), 8);
        assert_eq!(clamp_investment(-3.0, 10), 0);
        assert_eq!(clamp_investment(42.0, 10), 10);
        assert_eq!(clamp_investment(f64::NAN, 10), 0);
        assert_eq!(clamp_investment(f64::INFINITY, 10), 10);
        assert_eq!(clamp_investment(f64::NEG_INFINITY, 10), 0);
    }

    #[tokio::test]
    async fn operations_without_document_are_rejected() -> Result<(), ControllerError> {
        let store = Arc::new(MemorySessionStore::new());
        let controller = SessionController::new(store, SessionConfig::default()).await?;

        let joined = controller.join("Alpha").await;
        assert!(matches!(
            joined,
            Err(ControllerError::Rejected(RejectionReason::NoSession)),
        ));
        Ok(())
    }

    #[tokio::test]
    async fn join_validates_name_and_assigns_palette() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;

        assert!(matches!(
            controller.join("   ").await,
            Err(ControllerError::Rejected(RejectionReason::EmptyName)),
        ));
        assert!(matches!(
            controller.join("a name well past fifteen").await,
            Err(ControllerError::Rejected(RejectionReason::NameTooLong)),
        ));

        controller.join("  Alpha  ").await?;
        let session = controller.current().unwrap_or_default();
        let first = session.teams.first();
        assert_eq!(first.map(|t| t.name.as_str()), Some("Alpha"));
        assert_eq!(first.map(|t| t.color.as_str()), Some("bg-blue-500"));
        assert_eq!(first.map(|t| t.score), Some(Decimal::ZERO));
        Ok(())
    }

    #[tokio::test]
    async fn ten_joins_cycle_the_palette() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        for i in 0..10 {
            controller.join(&format!("Team {i}")).await?;
        }

        let session = controller.current().unwrap_or_default();
        assert_eq!(session.teams.len(), 10);
        // The tenth team wraps around to the first palette color.
        assert_eq!(
            session.teams.first().map(|t| t.color.as_str()),
            session.teams.last().map(|t| t.color.as_str()),
        );
        assert_eq!(
            session.teams.get(9).map(|t| t.color.as_str()),
            Some("bg-blue-500"),
        );
        Ok(())
    }

    #[tokio::test]
    async fn start_requires_setup_and_a_roster() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        assert!(matches!(
            controller.start().await,
            Err(ControllerError::Rejected(RejectionReason::EmptyRoster)),
        ));

        controller.join("Alpha").await?;
        controller.start().await?;

        let session = controller.current().unwrap_or_default();
        assert_eq!(session.status, SessionStatus::Playing);
        assert_eq!(session.current_round, 1);
        assert!(session.round_result.is_none());
        // Canonical cleared contract: a slot at 0 / not ready per team.
        let id = session.teams.first().map(|t| t.id);
        assert_eq!(id.and_then(|id| session.current_inputs.get(&id)), Some(&0));
        assert_eq!(
            id.and_then(|id| session.input_status.get(&id)),
            Some(&false),
        );

        // A second start is rejected once playing.
        assert!(matches!(
            controller.start().await,
            Err(ControllerError::Rejected(RejectionReason::NotInSetup)),
        ));
        Ok(())
    }

    #[tokio::test]
    async fn join_rejected_once_playing() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        controller.join("Alpha").await?;
        controller.start().await?;

        assert!(matches!(
            controller.join("Latecomer").await,
            Err(ControllerError::Rejected(RejectionReason::NotInSetup)),
        ));
        Ok(())
    }

    #[tokio::test]
    async fn submit_requires_playing_and_a_known_team() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;

        // Still in setup: no decisions yet.
        assert!(matches!(
            controller.submit_decision(alpha, 5.0).await,
            Err(ControllerError::Rejected(RejectionReason::NotPlaying)),
        ));

        controller.start().await?;
        assert!(matches!(
            controller.submit_decision(TeamId::new(), 5.0).await,
            Err(ControllerError::Rejected(RejectionReason::UnknownTeam)),
        ));

        controller.submit_decision(alpha, 5.0).await?;
        let session = controller.current().unwrap_or_default();
        assert_eq!(session.current_inputs.get(&alpha), Some(&5));
        assert_eq!(session.input_status.get(&alpha), Some(&true));
        Ok(())
    }

    #[tokio::test]
    async fn resubmission_overwrites_before_settlement() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        controller.start().await?;

        controller.submit_decision(alpha, 3.0).await?;
        controller.submit_decision(alpha, 8.0).await?;

        let session = controller.current().unwrap_or_default();
        assert_eq!(session.current_inputs.get(&alpha), Some(&8));
        Ok(())
    }

    #[tokio::test]
    async fn settle_blocked_until_all_ready() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        controller.join("Beta").await?;
        controller.start().await?;

        // Nobody has submitted.
        assert!(matches!(
            controller.settle_round().await,
            Err(ControllerError::Rejected(RejectionReason::NotReady)),
        ));

        // One of two submitted: still blocked.
        controller.submit_decision(alpha, 10.0).await?;
        assert!(matches!(
            controller.settle_round().await,
            Err(ControllerError::Rejected(RejectionReason::NotReady)),
        ));
        Ok(())
    }

    #[tokio::test]
    async fn settle_writes_result_history_and_reveal() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        let beta = controller.join("Beta").await?;
        controller.start().await?;

        play_round(&controller, &[(alpha, 10.0), (beta, 0.0)]).await?;

        let session = controller.current().unwrap_or_default();
        assert_eq!(session.status, SessionStatus::Reveal);
        assert_eq!(session.history.len(), 1);
        assert_eq!(
            session.history.first().map(|h| (h.round, h.total_invested)),
            Some((1, 10)),
        );
        let result = session.round_result.as_ref();
        assert_eq!(result.map(|r| r.multiplied_fund), Some(20));
        assert_eq!(
            session.team(alpha).map(|t| t.score),
            Some(Decimal::from(10)),
        );
        assert_eq!(session.team(beta).map(|t| t.score), Some(Decimal::from(20)));
        Ok(())
    }

    #[tokio::test]
    async fn advance_reopens_play_with_cleared_decisions() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        controller.start().await?;
        play_round(&controller, &[(alpha, 6.0)]).await?;

        controller.advance_round().await?;
        let session = controller.current().unwrap_or_default();
        assert_eq!(session.status, SessionStatus::Playing);
        assert_eq!(session.current_round, 2);
        assert!(session.round_result.is_none());
        assert_eq!(session.current_inputs.get(&alpha), Some(&0));
        assert_eq!(session.input_status.get(&alpha), Some(&false));
        Ok(())
    }

    #[tokio::test]
    async fn advance_after_final_round_ends_session() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        controller.start().await?;

        for round in 1..=5 {
            play_round(&controller, &[(alpha, 5.0)]).await?;
            controller.advance_round().await?;
            let session = controller.current().unwrap_or_default();
            if round < 5 {
                assert_eq!(session.status, SessionStatus::Playing);
            } else {
                assert_eq!(session.status, SessionStatus::End);
            }
        }

        // No further advance once ended.
        assert!(matches!(
            controller.advance_round().await,
            Err(ControllerError::Rejected(RejectionReason::NotInReveal)),
        ));
        Ok(())
    }

    #[tokio::test]
    async fn reset_returns_to_canonical_default() -> Result<(), ControllerError> {
        let controller = controller_with_session().await?;
        let alpha = controller.join("Alpha").await?;
        controller.start().await?;
        play_round(&controller, &[(alpha, 10.0)]).await?;

        controller.create_or_reset().await?;
        let session = controller.current().unwrap_or_default();
        assert_eq!(session, GameSession::default());
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Write fallback
    // -----------------------------------------------------------------------

    /// Store whose first merge write fails, exercising the replace
    /// fallback path.
    struct FlakyStore {
        inner: MemorySessionStore,
        failed_once: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemorySessionStore::new(),
                failed_once: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn subscribe(
            &self,
        ) -> Result<watch::Receiver<Option<GameSession>>, SyncError> {
            self.inner.subscribe().await
        }

        async fn create(&self, initial: GameSession) -> Result<(), SyncError> {
            self.inner.create(initial).await
        }

        async fn write_merge(&self, ops: &[PatchOp]) -> Result<(), SyncError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(SyncError::Backend("transient write failure".into()));
            }
            self.inner.write_merge(ops).await
        }

        async fn replace(&self, session: GameSession) -> Result<(), SyncError> {
            self.inner.replace(session).await
        }
    }

    #[tokio::test]
    async fn failed_merge_retries_as_replace() -> Result<(), ControllerError> {
        let store = Arc::new(FlakyStore::new());
        let controller = SessionController::new(store, SessionConfig::default()).await?;
        controller.create_or_reset().await?;

        // The first merge write fails; the join still lands via replace.
        controller.join("Alpha").await?;
        let session = controller.current().unwrap_or_default();
        assert_eq!(session.teams.len(), 1);
        Ok(())
    }
}
