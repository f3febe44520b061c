//! The shared `GameSession` aggregate and its invariants.
//!
//! Exactly one session document exists per deployment (a single global
//! room, keyed by [`SESSION_DOC_ID`]). Every client derives its entire
//! view from the latest snapshot of this aggregate; there is no
//! client-local authoritative state.
//!
//! Scores use [`Decimal`] -- the per-round payout division is not
//! guaranteed integral and the authoritative score retains full
//! precision. Rounding to one decimal is a presentation concern.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::SessionStatus;
use crate::ids::TeamId;

/// Number of rounds in a full session.
pub const TOTAL_ROUNDS: u32 = 5;

/// Tokens each team can allocate per round.
pub const INITIAL_TOKENS: u32 = 10;

/// Fixed identifier of the single shared session document.
///
/// Multiple simultaneous workshops are out of scope; a second deployment
/// gets a second store, not a second key.
pub const SESSION_DOC_ID: &str = "game_session/main";

/// Fixed team color palette, assigned round-robin at join time.
///
/// Colors repeat once the roster grows past the palette size. This is
/// deliberate; nothing requires globally unique colors.
pub const TEAM_COLORS: [&str; 9] = [
    "bg-blue-500",
    "bg-orange-500",
    "bg-purple-500",
    "bg-teal-500",
    "bg-pink-500",
    "bg-red-500",
    "bg-green-500",
    "bg-indigo-500",
    "bg-yellow-500",
];

/// Look up the palette color for the team at roster position `index`.
pub fn palette_color(index: usize) -> &'static str {
    index
        .checked_rem(TEAM_COLORS.len())
        .and_then(|i| TEAM_COLORS.get(i))
        .copied()
        .unwrap_or("bg-blue-500")
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

/// A registered team in the session roster.
///
/// `id` and `color` are assigned at join time and never change. `score`
/// starts at zero and is monotonically non-decreasing across settlements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Team {
    /// Unique identifier, assigned at join, immutable.
    pub id: TeamId,
    /// Display name chosen by the team at join.
    pub name: String,
    /// Palette color token assigned round-robin at join.
    pub color: String,
    /// Accumulated score, full precision.
    #[ts(as = "String")]
    pub score: Decimal,
}

impl Team {
    /// Create a fresh team with a new ID and a zero score.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: TeamId::new(),
            name: name.into(),
            color: color.into(),
            score: Decimal::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// RoundResult
// ---------------------------------------------------------------------------

/// Per-team breakdown of a settled round.
///
/// `name` and `color` are denormalized from the roster at settlement time
/// so the reveal table renders without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoundDetail {
    /// The team this row belongs to.
    pub team_id: TeamId,
    /// Team display name at settlement time.
    pub name: String,
    /// Team color token at settlement time.
    pub color: String,
    /// Tokens the team put into the shared fund.
    pub invested: u32,
    /// Tokens the team held back (`INITIAL_TOKENS - invested`).
    pub kept: u32,
}

/// The consolidated outcome of one settled round.
///
/// Produced once per settlement, replaced whole by the next settlement,
/// and cleared when the session advances to the next round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct RoundResult {
    /// Sum of all teams' invested tokens.
    pub total_invested: u32,
    /// `total_invested` times the round multiplier.
    pub multiplied_fund: u32,
    /// Equal share of the multiplied fund per team, full precision.
    #[ts(as = "String")]
    pub payout_per_team: Decimal,
    /// Per-team breakdown in roster order.
    pub details: Vec<RoundDetail>,
}

/// One entry of the per-round investment log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct HistoryEntry {
    /// The round that was settled.
    pub round: u32,
    /// Sum of all teams' invested tokens in that round.
    pub total_invested: u32,
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// The root aggregate governing one run of the workshop game.
///
/// Serialized as the camel-cased JSON document all clients subscribe to.
/// The absent-vs-zero distinction in `currentInputs` is significant: a
/// missing key means "never submitted", a `0` means "submitted zero".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GameSession {
    /// Current phase of the state machine.
    pub status: SessionStatus,
    /// Current round, 1-based, at most [`TOTAL_ROUNDS`].
    pub current_round: u32,
    /// Ordered roster; append-only during `Setup`, frozen during play.
    pub teams: Vec<Team>,
    /// Pending decisions for the current round, keyed by team.
    pub current_inputs: BTreeMap<TeamId, u32>,
    /// Whether each team has submitted for the current round.
    pub input_status: BTreeMap<TeamId, bool>,
    /// Outcome of the most recently settled round, if on display.
    pub round_result: Option<RoundResult>,
    /// Per-round investment log, one entry per settled round.
    pub history: Vec<HistoryEntry>,
}

impl Default for GameSession {
    /// The canonical default state produced by `createOrReset`.
    fn default() -> Self {
        Self {
            status: SessionStatus::Setup,
            current_round: 1,
            teams: Vec::new(),
            current_inputs: BTreeMap::new(),
            input_status: BTreeMap::new(),
            round_result: None,
            history: Vec::new(),
        }
    }
}

impl GameSession {
    /// Look up a team by ID.
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Whether the roster contains the given team.
    pub fn contains_team(&self, id: TeamId) -> bool {
        self.team(id).is_some()
    }

    /// The invested amount recorded for a team, treating absent as zero.
    pub fn invested_for(&self, id: TeamId) -> u32 {
        self.current_inputs.get(&id).copied().unwrap_or(0)
    }

    /// Teams ordered by score, highest first.
    pub fn standings(&self) -> Vec<&Team> {
        let mut ranked: Vec<&Team> = self.teams.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Verify the structural invariants of the aggregate.
    ///
    /// Called by tests and by the controller's debug paths after every
    /// transition. `total_rounds` and `initial_tokens` come from the
    /// session configuration (defaults [`TOTAL_ROUNDS`] and
    /// [`INITIAL_TOKENS`]).
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn verify_invariants(
        &self,
        total_rounds: u32,
        initial_tokens: u32,
    ) -> Result<(), InvariantViolation> {
        if self.current_round < 1 || self.current_round > total_rounds {
            return Err(InvariantViolation::RoundOutOfRange {
                round: self.current_round,
                total_rounds,
            });
        }

        for team_id in self.input_status.keys() {
            if !self.contains_team(*team_id) {
                return Err(InvariantViolation::StrayDecisionKey { team: *team_id });
            }
        }
        for team_id in self.current_inputs.keys() {
            if !self.contains_team(*team_id) {
                return Err(InvariantViolation::StrayDecisionKey { team: *team_id });
            }
        }

        // While a round is open, every rostered team has a readiness slot.
        if self.status == SessionStatus::Playing {
            for team in &self.teams {
                if !self.input_status.contains_key(&team.id) {
                    return Err(InvariantViolation::MissingDecisionSlot { team: team.id });
                }
            }
        }

        for (team_id, invested) in &self.current_inputs {
            if *invested > initial_tokens {
                return Err(InvariantViolation::InvestmentOutOfRange {
                    team: *team_id,
                    invested: *invested,
                    initial_tokens,
                });
            }
        }

        for team in &self.teams {
            if team.score < Decimal::ZERO {
                return Err(InvariantViolation::NegativeScore { team: team.id });
            }
        }

        let mut last_round = 0;
        for entry in &self.history {
            if entry.round <= last_round || entry.round > total_rounds {
                return Err(InvariantViolation::HistoryNotChronological {
                    round: entry.round,
                });
            }
            last_round = entry.round;
        }

        Ok(())
    }
}

/// A structural invariant of the session aggregate did not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// `currentRound` fell outside `1..=totalRounds`.
    #[error("current round {round} outside 1..={total_rounds}")]
    RoundOutOfRange {
        /// The offending round number.
        round: u32,
        /// The configured round count.
        total_rounds: u32,
    },

    /// A decision map holds a key for a team not in the roster.
    #[error("decision entry for unknown team {team}")]
    StrayDecisionKey {
        /// The unknown team ID.
        team: TeamId,
    },

    /// A rostered team has no readiness slot while a round is open.
    #[error("team {team} has no readiness slot while playing")]
    MissingDecisionSlot {
        /// The team missing a slot.
        team: TeamId,
    },

    /// A recorded investment exceeds the per-round token budget.
    #[error("team {team} invested {invested}, budget is {initial_tokens}")]
    InvestmentOutOfRange {
        /// The offending team.
        team: TeamId,
        /// The recorded amount.
        invested: u32,
        /// The per-round token budget.
        initial_tokens: u32,
    },

    /// A team's score went negative.
    #[error("team {team} has a negative score")]
    NegativeScore {
        /// The offending team.
        team: TeamId,
    },

    /// History entries are not strictly increasing by round.
    #[error("history entry for round {round} out of order")]
    HistoryNotChronological {
        /// The offending round number.
        round: u32,
    },
}
