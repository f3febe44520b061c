//! Typed field-path merge operations on the session aggregate.
//!
//! The sync layer's `write_merge` primitive takes a slice of [`PatchOp`]
//! values instead of stringly-typed document paths. Each op touches a
//! named region of the aggregate and leaves everything else alone, which
//! is what lets concurrent team submissions land without clobbering each
//! other: [`PatchOp::SetDecision`] writes only that team's two entries.
//!
//! No transactional isolation exists between ops issued by independent
//! writers; delivery order decides which facilitator rewrite a racing
//! team submission lands before or after. That is the accepted
//! eventual-consistency contract of a small supervised session.

use crate::enums::SessionStatus;
use crate::ids::TeamId;
use crate::session::{GameSession, HistoryEntry, RoundResult, Team};

/// One typed merge operation against the shared session document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOp {
    /// Append a team to the roster and initialize its readiness slot
    /// to `false`. The team's `currentInputs` entry stays absent until
    /// its first submission.
    AppendTeam(Team),

    /// Set the session phase.
    SetStatus(SessionStatus),

    /// Set the current round number.
    SetCurrentRound(u32),

    /// Replace the roster wholesale (settlement writes updated scores).
    /// Decision maps are left untouched.
    SetTeams(Vec<Team>),

    /// Set or clear the round result on display.
    SetRoundResult(Option<RoundResult>),

    /// Append one entry to the per-round investment log.
    AppendHistory(HistoryEntry),

    /// Record a team's decision: `currentInputs[team] = invested`,
    /// `inputStatus[team] = true`. Resubmission overwrites.
    SetDecision {
        /// The submitting team.
        team: TeamId,
        /// Clamped invested amount.
        invested: u32,
    },

    /// Rebuild both decision maps for the current roster: every team's
    /// input set to `0`, every readiness flag to `false`. Entries for
    /// teams no longer rostered are dropped.
    ResetDecisions,
}

impl GameSession {
    /// Apply a single merge operation in place.
    pub fn apply_patch(&mut self, op: &PatchOp) {
        match op {
            PatchOp::AppendTeam(team) => {
                self.input_status.insert(team.id, false);
                self.teams.push(team.clone());
            }
            PatchOp::SetStatus(status) => {
                self.status = *status;
            }
            PatchOp::SetCurrentRound(round) => {
                self.current_round = *round;
            }
            PatchOp::SetTeams(teams) => {
                self.teams = teams.clone();
            }
            PatchOp::SetRoundResult(result) => {
                self.round_result = result.clone();
            }
            PatchOp::AppendHistory(entry) => {
                self.history.push(*entry);
            }
            PatchOp::SetDecision { team, invested } => {
                self.current_inputs.insert(*team, *invested);
                self.input_status.insert(*team, true);
            }
            PatchOp::ResetDecisions => {
                self.current_inputs = self.teams.iter().map(|t| (t.id, 0)).collect();
                self.input_status = self.teams.iter().map(|t| (t.id, false)).collect();
            }
        }
    }

    /// Apply a sequence of merge operations in order.
    pub fn apply_all(&mut self, ops: &[PatchOp]) {
        for op in ops {
            self.apply_patch(op);
        }
    }
}
