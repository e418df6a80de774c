//! Bet Definitions
//!
//! A bet is scoped to exactly one round. Anything that crosses a round
//! boundary does so as a brand-new bet (see [`RepeatPolicy`]).

use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::money::payout;
use crate::game::round::RoundId;

/// Independent betting slot. A player may hold one bet per panel per round.
pub type PanelId = u8;

/// Unique bet identifier.
pub type BetId = Uuid;

/// Bet lifecycle: `Pending -> Active -> {Cashed | Lost}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    /// Placed during the countdown; stake already debited.
    Pending,
    /// Riding the current round.
    Active,
    /// Cashed out before the crash.
    Cashed,
    /// Still active when the round crashed.
    Lost,
}

impl BetStatus {
    /// Cashed or Lost.
    pub fn is_settled(self) -> bool {
        matches!(self, BetStatus::Cashed | BetStatus::Lost)
    }
}

/// Who placed the bet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BetOwner {
    /// The local player, on one of their panels.
    Player {
        /// Panel the bet was placed from.
        panel: PanelId,
    },
    /// A synthetic opponent.
    Simulated {
        /// Masked display name.
        username: String,
    },
}

/// Owner discriminant without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerKind {
    /// The local player.
    Player,
    /// A synthetic opponent.
    Simulated,
}

impl BetOwner {
    /// Owner kind.
    pub fn kind(&self) -> OwnerKind {
        match self {
            BetOwner::Player { .. } => OwnerKind::Player,
            BetOwner::Simulated { .. } => OwnerKind::Simulated,
        }
    }

    /// Panel, for player bets.
    pub fn panel(&self) -> Option<PanelId> {
        match self {
            BetOwner::Player { panel } => Some(*panel),
            BetOwner::Simulated { .. } => None,
        }
    }
}

/// Whether a bet re-enters the next round on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatPolicy {
    /// Single round only.
    #[default]
    Once,
    /// Re-placed with the same stake and threshold every round (auto-bet).
    EveryRound,
}

impl RepeatPolicy {
    /// Build from the auto-bet flag.
    pub fn from_auto_bet(enabled: bool) -> Self {
        if enabled {
            RepeatPolicy::EveryRound
        } else {
            RepeatPolicy::Once
        }
    }
}

/// Optional settings for a placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BetOptions {
    /// Repeat this bet every round.
    pub auto_bet: bool,
    /// Cash out automatically once the multiplier reaches this value.
    pub auto_cashout: Option<f64>,
}

/// A wager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    /// Unique per placement.
    pub id: BetId,
    /// Placer.
    pub owner: BetOwner,
    /// Round this bet belongs to.
    pub round_id: RoundId,
    /// Stake.
    pub amount: f64,
    /// Lifecycle state.
    pub status: BetStatus,
    /// Auto-cashout threshold (> 1.0).
    pub auto_cashout: Option<f64>,
    /// Carry-over policy.
    pub repeat: RepeatPolicy,
    /// Multiplier the bet was cashed at.
    pub cashout_multiplier: Option<f64>,
    /// Credited amount, `round2(amount * cashout_multiplier)`.
    pub winnings: Option<f64>,
}

impl Bet {
    /// New pending bet.
    pub fn pending(
        owner: BetOwner,
        round_id: RoundId,
        amount: f64,
        auto_cashout: Option<f64>,
        repeat: RepeatPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            round_id,
            amount,
            status: BetStatus::Pending,
            auto_cashout,
            repeat,
            cashout_multiplier: None,
            winnings: None,
        }
    }

    /// Clone into a fresh pending bet for `round_id`.
    pub fn carry_into(&self, round_id: RoundId) -> Self {
        Self::pending(self.owner.clone(), round_id, self.amount, self.auto_cashout, self.repeat)
    }

    /// Panel, for player bets.
    pub fn panel(&self) -> Option<PanelId> {
        self.owner.panel()
    }

    /// Whether the auto-cashout threshold fires at `live` for a round
    /// crashing at `crash_value`.
    ///
    /// A threshold strictly below the crash value was passed on the way up,
    /// so it still fires on the tick that reaches the crash value. A
    /// threshold equal to the crash value never fires.
    pub fn auto_cashout_due(&self, live: f64, crash_value: f64) -> bool {
        match self.auto_cashout {
            Some(threshold) => {
                self.status == BetStatus::Active && live >= threshold && threshold < crash_value
            }
            None => false,
        }
    }

    /// Settle as cashed at `multiplier`; returns the winnings.
    ///
    /// Only an active bet can be cashed; anything else returns `None`.
    pub(crate) fn cash_out(&mut self, multiplier: f64) -> Option<f64> {
        if self.status != BetStatus::Active {
            return None;
        }
        let winnings = payout(self.amount, multiplier);
        self.status = BetStatus::Cashed;
        self.cashout_multiplier = Some(multiplier);
        self.winnings = Some(winnings);
        Some(winnings)
    }
}

/// Outcome of a single cash-out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CashoutRecord {
    /// Bet that was cashed.
    pub bet_id: BetId,
    /// Owner kind.
    pub owner: OwnerKind,
    /// Panel, for player bets.
    pub panel: Option<PanelId>,
    /// Multiplier used.
    pub multiplier: f64,
    /// Credited winnings.
    pub winnings: f64,
    /// Triggered by the threshold rather than by hand.
    pub automatic: bool,
}

impl CashoutRecord {
    pub(crate) fn new(bet: &Bet, automatic: bool) -> Self {
        Self {
            bet_id: bet.id,
            owner: bet.owner.kind(),
            panel: bet.panel(),
            multiplier: bet.cashout_multiplier.unwrap_or(1.0),
            winnings: bet.winnings.unwrap_or(0.0),
            automatic,
        }
    }
}
