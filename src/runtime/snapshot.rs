//! Engine Snapshots
//!
//! The read model handed to presentation layers. Captured after every
//! engine step and command; consumers never touch the engine directly.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::game::bet::{Bet, PanelId};
use crate::game::engine::RoundEngine;
use crate::game::round::RoundId;
use crate::game::state::Phase;

/// Point-in-time view of the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Current round.
    pub round_id: RoundId,
    /// When the current round was generated.
    pub round_created_at: DateTime<Utc>,
    /// Current phase.
    pub phase: Phase,
    /// Seconds left before the round starts.
    pub countdown: u32,
    /// Live multiplier (two decimals).
    pub live_multiplier: f64,
    /// Crash value; `None` until the round has crashed.
    pub crash_value: Option<f64>,
    /// When the round crashed.
    pub crashed_at: Option<DateTime<Utc>>,
    /// Recent crash values, most recent first (`"2.00x"`).
    pub history: Vec<String>,
    /// Player balance.
    pub balance: f64,
    /// The player's bets.
    pub player_bets: Vec<Bet>,
    /// Simulated opponents' bets.
    pub simulated_bets: Vec<Bet>,
    /// Growth rate tunable.
    pub growth_rate: f64,
    /// Growth exponent tunable.
    pub growth_exponent: f64,
    /// Countdown length for the next round.
    pub round_wait_seconds: u32,
}

impl EngineSnapshot {
    /// Capture the engine's current state.
    pub fn capture(engine: &RoundEngine) -> Self {
        let growth = engine.growth();
        Self {
            round_id: engine.round_id(),
            round_created_at: engine.round_created_at(),
            phase: engine.phase(),
            countdown: engine.countdown(),
            live_multiplier: engine.live_multiplier(),
            crash_value: engine.revealed_crash_value(),
            crashed_at: engine.crashed_at(),
            history: engine.history().labels(),
            balance: engine.balance(),
            player_bets: engine.player_bets().to_vec(),
            simulated_bets: engine.simulated_bets().to_vec(),
            growth_rate: growth.rate,
            growth_exponent: growth.exponent,
            round_wait_seconds: engine.round_wait_seconds(),
        }
    }

    /// The player's bet on `panel` in this round.
    pub fn bet_for_panel(&self, panel: PanelId) -> Option<&Bet> {
        self.player_bets
            .iter()
            .find(|b| b.round_id == self.round_id && b.panel() == Some(panel))
    }

    /// Potential payout of the panel's bet at the live multiplier.
    pub fn potential_payout(&self, panel: PanelId) -> Option<f64> {
        self.bet_for_panel(panel)
            .map(|b| crate::core::money::payout(b.amount, self.live_multiplier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::bet::BetOptions;

    #[test]
    fn test_capture_hides_crash_value() {
        let mut engine = RoundEngine::new(&EngineConfig {
            rng_seed: Some(9),
            ..Default::default()
        });
        assert!(engine.place_bet(1, 25.0, BetOptions::default()));

        let snapshot = EngineSnapshot::capture(&engine);
        assert_eq!(snapshot.phase, Phase::Waiting);
        assert_eq!(snapshot.crash_value, None);
        assert_eq!(snapshot.balance, 2975.0);
        assert_eq!(snapshot.simulated_bets.len(), 30);
        assert_eq!(snapshot.bet_for_panel(1).map(|b| b.amount), Some(25.0));
        assert_eq!(snapshot.potential_payout(1), Some(25.0));
        assert!(snapshot.bet_for_panel(2).is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let engine = RoundEngine::new(&EngineConfig {
            rng_seed: Some(9),
            ..Default::default()
        });
        let json = serde_json::to_value(EngineSnapshot::capture(&engine)).unwrap();
        assert_eq!(json["phase"], "WAITING");
        assert_eq!(json["crash_value"], serde_json::Value::Null);
        assert_eq!(json["round_id"], 1);
    }
}
