//! The all-teams-submitted guard.

use commons_types::GameSession;

/// Whether every rostered team has submitted its decision this round.
///
/// An empty roster is never ready; settlement over zero teams is a
/// facilitator mistake, not a degenerate round.
pub fn all_ready(session: &GameSession) -> bool {
    !session.teams.is_empty()
        && session
            .teams
            .iter()
            .all(|team| session.input_status.get(&team.id).copied().unwrap_or(false))
}
