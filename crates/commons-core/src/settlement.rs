//! The round-settlement engine: a pure payoff computation.
//!
//! Settlement converts the collected decisions of one round into the
//! consolidated [`RoundResult`], the roster with updated scores, and the
//! history entry. It reads nothing but its arguments and mutates
//! nothing, so every numeric contract is unit-testable without a store.
//!
//! The payoff rule: each team keeps what it did not invest; the pooled
//! investments are multiplied (x2, or x3 on the final round) and split
//! equally across the roster. `roundEarned = kept + payoutPerTeam` is
//! never negative, which is what makes scores monotonic.

use rust_decimal::Decimal;

use commons_types::{GameSession, HistoryEntry, RoundDetail, RoundResult, Team, TeamId};

use crate::config::SessionConfig;

/// Everything a settlement produces, applied together by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// The consolidated round outcome for the reveal screen.
    pub round_result: RoundResult,
    /// The roster with post-round scores.
    pub updated_teams: Vec<Team>,
    /// The `{round, totalInvested}` log entry.
    pub history_entry: HistoryEntry,
}

/// The fund multiplier for a given round.
pub const fn round_multiplier(current_round: u32, config: &SessionConfig) -> u32 {
    if current_round == config.total_rounds {
        config.final_round_multiplier
    } else {
        config.base_multiplier
    }
}

/// Settle one round.
///
/// `session.current_inputs` entries are expected to be pre-clamped to
/// `0..=initial_tokens`; an absent entry reads as zero. The divisor is
/// floored at 1 as a defensive guard -- the controller's readiness
/// check already forbids settling an empty roster.
pub fn settle(session: &GameSession, config: &SessionConfig) -> Settlement {
    let team_count = session.teams.len().max(1);
    let multiplier = round_multiplier(session.current_round, config);

    let mut total_invested: u32 = 0;
    let mut details = Vec::with_capacity(session.teams.len());
    for team in &session.teams {
        let invested = session.invested_for(team.id).min(config.initial_tokens);
        let kept = config.initial_tokens.saturating_sub(invested);
        total_invested = total_invested.saturating_add(invested);
        details.push(RoundDetail {
            team_id: team.id,
            name: team.name.clone(),
            color: team.color.clone(),
            invested,
            kept,
        });
    }

    let multiplied_fund = total_invested.saturating_mul(multiplier);
    let payout_per_team = Decimal::from(multiplied_fund)
        .checked_div(Decimal::from(team_count))
        .unwrap_or(Decimal::ZERO);

    let updated_teams = session
        .teams
        .iter()
        .map(|team| {
            let earned = round_earned(session, team.id, config, payout_per_team);
            Team {
                id: team.id,
                name: team.name.clone(),
                color: team.color.clone(),
                score: team.score.saturating_add(earned),
            }
        })
        .collect();

    Settlement {
        round_result: RoundResult {
            total_invested,
            multiplied_fund,
            payout_per_team,
            details,
        },
        updated_teams,
        history_entry: HistoryEntry {
            round: session.current_round,
            total_invested,
        },
    }
}

/// What one team earns this round: kept tokens plus the equal payout.
fn round_earned(
    session: &GameSession,
    team: TeamId,
    config: &SessionConfig,
    payout_per_team: Decimal,
) -> Decimal {
    let invested = session.invested_for(team).min(config.initial_tokens);
    let kept = config.initial_tokens.saturating_sub(invested);
    Decimal::from(kept).saturating_add(payout_per_team)
}
