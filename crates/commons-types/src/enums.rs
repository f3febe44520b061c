//! Enumeration types for the session document and controller boundary.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// The phase of the shared session state machine.
///
/// Transitions: `Setup -> Playing -> Reveal -> Playing | End`. A reset
/// returns to `Setup` from any phase. The "waiting host" screen shown by
/// clients before the document exists is a local view state, not a phase
/// of the shared document (see `ClientView` in the core crate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SessionStatus {
    /// Teams are joining; the roster is append-only.
    Setup,
    /// A round is open for decisions; the roster is frozen.
    Playing,
    /// The round has been settled and results are on display.
    Reveal,
    /// The final round has been revealed; the session is over.
    End,
}

impl core::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Setup => "setup",
            Self::Playing => "playing",
            Self::Reveal => "reveal",
            Self::End => "end",
        };
        write!(f, "{name}")
    }
}

/// Why a controller operation was rejected at the boundary.
///
/// A rejected operation writes nothing: the shared document is never
/// partially mutated, and the caller's UI is expected to have disabled
/// the trigger in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RejectionReason {
    /// No session document exists yet.
    NoSession,
    /// The operation requires `Setup` and the session is elsewhere.
    NotInSetup,
    /// The operation requires `Playing` and the session is elsewhere.
    NotPlaying,
    /// The operation requires `Reveal` and the session is elsewhere.
    NotInReveal,
    /// The join name was empty after trimming.
    EmptyName,
    /// The join name exceeded the configured length bound.
    NameTooLong,
    /// The team ID is not present in the roster.
    UnknownTeam,
    /// The roster is empty where at least one team is required.
    EmptyRoster,
    /// Not every team has submitted a decision for the current round.
    NotReady,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Playing).unwrap_or_default();
        assert_eq!(json, "\"playing\"");
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            SessionStatus::Setup,
            SessionStatus::Playing,
            SessionStatus::Reveal,
            SessionStatus::End,
        ] {
            let json = serde_json::to_string(&status).unwrap_or_default();
            let back: Result<SessionStatus, _> = serde_json::from_str(&json);
            assert_eq!(back.ok(), Some(status));
        }
    }

    #[test]
    fn status_display_matches_wire_form() {
        assert_eq!(SessionStatus::Reveal.to_string(), "reveal");
    }
}
