//! Engine Events
//!
//! Emitted by each engine step, for logging and for subscribers.

use serde::{Serialize, Deserialize};

use crate::game::bet::{BetId, CashoutRecord, PanelId};
use crate::game::round::RoundId;
use crate::game::state::Phase;

/// Event payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEventData {
    /// A new round accepts bets.
    RoundOpened {
        /// Countdown length in seconds.
        countdown: u32,
    },
    /// Countdown ticked.
    Countdown {
        /// Seconds left.
        seconds: u32,
    },
    /// The player placed a bet.
    BetPlaced {
        /// Panel used.
        panel: PanelId,
        /// New bet.
        bet_id: BetId,
        /// Stake.
        amount: f64,
    },
    /// Phase transition.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// A bet was cashed out (player or simulated).
    CashedOut(CashoutRecord),
    /// The round crashed.
    Crashed {
        /// Final multiplier.
        crash_value: f64,
        /// Bets that were still riding.
        lost_bets: usize,
    },
}

/// An event with the round it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Round the event happened in.
    pub round_id: RoundId,
    /// Payload.
    pub data: EngineEventData,
}

impl EngineEvent {
    /// Create a new event.
    pub fn new(round_id: RoundId, data: EngineEventData) -> Self {
        Self { round_id, data }
    }

    /// Create phase changed event.
    pub fn phase_changed(round_id: RoundId, from: Phase, to: Phase) -> Self {
        Self::new(round_id, EngineEventData::PhaseChanged { from, to })
    }

    /// Create cashed out event.
    pub fn cashed_out(round_id: RoundId, record: CashoutRecord) -> Self {
        Self::new(round_id, EngineEventData::CashedOut(record))
    }
}
