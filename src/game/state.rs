//! Round Phase
//!
//! The process-wide phase, plus the token scheduled callbacks capture so a
//! late wake-up can tell it no longer owns the round.

use serde::{Serialize, Deserialize};

use crate::game::round::RoundId;

/// Phase of the current round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Countdown; bets are accepted.
    #[default]
    Waiting,
    /// Multiplier climbing; cash-outs are accepted.
    Running,
    /// Round over; results on display until the next round opens.
    Crashed,
}

impl Phase {
    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Waiting => "WAITING",
            Phase::Running => "RUNNING",
            Phase::Crashed => "CRASHED",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(round, phase)` captured when a timer is scheduled.
///
/// A timer whose token no longer matches the engine's is stale and must
/// not touch state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseToken {
    /// Round the timer was scheduled for.
    pub round_id: RoundId,
    /// Phase the timer was scheduled in.
    pub phase: Phase,
}
