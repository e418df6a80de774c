//! Bet Ledger
//!
//! Owns every wager of the current round (the player's and the simulated
//! opponents') together with the player's balance. Only placement, carry-over
//! and pending-amount edits debit the balance; only cash-outs credit it.

use tracing::{debug, warn};

use crate::core::money::round2;
use crate::core::rng::UniformSource;
use crate::game::bet::{
    Bet, BetId, BetOptions, BetOwner, BetStatus, CashoutRecord, OwnerKind, PanelId, RepeatPolicy,
};
use crate::game::round::RoundId;
use crate::game::state::Phase;

/// Stakes simulated opponents pick from.
pub const SIMULATED_STAKES: [f64; 5] = [5.0, 10.0, 20.0, 50.0, 100.0];

/// Lowest auto-cashout threshold a simulated opponent uses.
pub const SIMULATED_MIN_CASHOUT: f64 = 1.1;

/// Width of the simulated auto-cashout range (`1.1x ..= 4.1x`).
pub const SIMULATED_CASHOUT_SPAN: f64 = 3.0;

/// Why a placement was refused.
///
/// These are ordinary user-facing refusals, not failures: the command
/// surface reports them as `false`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BetRejection {
    /// Bets are only taken during the countdown.
    #[error("Bets are not accepted while {0}")]
    WrongPhase(Phase),

    /// Stake is zero, negative or not a number.
    #[error("Invalid stake")]
    InvalidAmount,

    /// Stake exceeds the balance.
    #[error("Insufficient balance: {balance:.2} available, {amount:.2} requested")]
    InsufficientBalance {
        /// Current balance.
        balance: f64,
        /// Requested stake.
        amount: f64,
    },

    /// Auto-cashout threshold must be finite and above 1.00x.
    #[error("Invalid auto-cashout threshold")]
    InvalidAutoCashout,

    /// The panel already holds a bet for this round.
    #[error("Panel {0} already has a bet this round")]
    DuplicatePanel(PanelId),
}

/// All wagers of the current round plus the player's balance.
#[derive(Clone, Debug)]
pub struct BetLedger {
    balance: f64,
    player_bets: Vec<Bet>,
    simulated_bets: Vec<Bet>,
}

impl BetLedger {
    /// Create an empty ledger with a starting balance.
    pub fn new(starting_balance: f64) -> Self {
        Self {
            balance: round2(starting_balance.max(0.0)),
            player_bets: Vec::new(),
            simulated_bets: Vec::new(),
        }
    }

    /// Current balance.
    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// The player's bets.
    pub fn player_bets(&self) -> &[Bet] {
        &self.player_bets
    }

    /// The simulated opponents' bets.
    pub fn simulated_bets(&self) -> &[Bet] {
        &self.simulated_bets
    }

    /// The player's bet on `panel` for `round_id`, if any.
    pub fn bet_for_panel(&self, round_id: RoundId, panel: PanelId) -> Option<&Bet> {
        self.player_bets
            .iter()
            .find(|b| b.round_id == round_id && b.panel() == Some(panel))
    }

    /// Place a bet for the player.
    ///
    /// Debits the stake immediately. On any refusal nothing changes.
    pub fn place(
        &mut self,
        round_id: RoundId,
        phase: Phase,
        panel: PanelId,
        amount: f64,
        options: BetOptions,
    ) -> Result<BetId, BetRejection> {
        if phase != Phase::Waiting {
            return Err(BetRejection::WrongPhase(phase));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BetRejection::InvalidAmount);
        }
        if amount > self.balance {
            return Err(BetRejection::InsufficientBalance {
                balance: self.balance,
                amount,
            });
        }
        if let Some(threshold) = options.auto_cashout {
            if !threshold.is_finite() || threshold <= 1.0 {
                return Err(BetRejection::InvalidAutoCashout);
            }
        }
        if self.bet_for_panel(round_id, panel).is_some() {
            return Err(BetRejection::DuplicatePanel(panel));
        }

        let bet = Bet::pending(
            BetOwner::Player { panel },
            round_id,
            amount,
            options.auto_cashout,
            RepeatPolicy::from_auto_bet(options.auto_bet),
        );
        let id = bet.id;
        self.debit(amount);
        self.player_bets.push(bet);
        Ok(id)
    }

    /// Turn every pending bet of `round_id` active. Returns how many moved.
    pub fn activate_all(&mut self, round_id: RoundId) -> usize {
        let mut activated = 0;
        for bet in self.bets_mut(round_id) {
            if bet.status == BetStatus::Pending {
                bet.status = BetStatus::Active;
                activated += 1;
            }
        }
        activated
    }

    /// Cash out every active bet whose threshold `live` has reached, at the
    /// threshold, provided the threshold is below `crash_value`.
    ///
    /// Must run before the crash check of the same tick.
    pub fn tick_auto_cashouts(
        &mut self,
        round_id: RoundId,
        live: f64,
        crash_value: f64,
    ) -> Vec<CashoutRecord> {
        let mut records = Vec::new();
        let mut credit = 0.0;

        for bet in self.bets_mut(round_id) {
            if !bet.auto_cashout_due(live, crash_value) {
                continue;
            }
            let Some(threshold) = bet.auto_cashout else { continue };
            if let Some(winnings) = bet.cash_out(threshold) {
                if bet.owner.kind() == OwnerKind::Player {
                    credit += winnings;
                }
                records.push(CashoutRecord::new(bet, true));
            }
        }

        for record in &records {
            if record.owner == OwnerKind::Player {
                debug!(
                    "Auto cash-out on panel {:?} at {:.2}x for {:.2}",
                    record.panel, record.multiplier, record.winnings
                );
            }
        }
        if credit > 0.0 {
            self.credit(credit);
        }
        records
    }

    /// Cash out the player's active bet on `panel` at the live multiplier.
    ///
    /// Returns `None` (and changes nothing) unless the round is running and
    /// the panel holds an active bet for it.
    pub fn manual_cashout(
        &mut self,
        round_id: RoundId,
        phase: Phase,
        panel: PanelId,
        live: f64,
    ) -> Option<CashoutRecord> {
        if phase != Phase::Running {
            return None;
        }
        let bet = self.player_bets.iter_mut().find(|b| {
            b.round_id == round_id && b.panel() == Some(panel) && b.status == BetStatus::Active
        })?;
        let winnings = bet.cash_out(live)?;
        let record = CashoutRecord::new(bet, false);
        self.credit(winnings);
        Some(record)
    }

    /// Every bet of `round_id` still active is lost. Returns how many.
    pub fn settle_losses(&mut self, round_id: RoundId) -> usize {
        let mut lost = 0;
        for bet in self.bets_mut(round_id) {
            if bet.status == BetStatus::Active {
                bet.status = BetStatus::Lost;
                lost += 1;
            }
        }
        lost
    }

    /// Clone every repeating player bet into a fresh pending bet for
    /// `next_round_id`, debiting each stake.
    ///
    /// A carry the balance cannot cover is dropped.
    pub fn carry_auto_bets(&mut self, next_round_id: RoundId) -> Vec<Bet> {
        let repeating: Vec<Bet> = self
            .player_bets
            .iter()
            .filter(|b| b.repeat == RepeatPolicy::EveryRound && b.round_id < next_round_id)
            .map(|b| b.carry_into(next_round_id))
            .collect();

        let mut carried = Vec::with_capacity(repeating.len());
        for bet in repeating {
            if bet.amount > self.balance {
                warn!(
                    "Auto-bet on panel {:?} dropped: balance {:.2} below stake {:.2}",
                    bet.panel(),
                    self.balance,
                    bet.amount
                );
                continue;
            }
            self.debit(bet.amount);
            carried.push(bet);
        }
        carried
    }

    /// Retire the finished round and open `next_round_id`: carried auto-bets
    /// become the player's bets, and a fresh opponent set is generated.
    pub fn begin_round(
        &mut self,
        next_round_id: RoundId,
        source: &mut dyn UniformSource,
        simulated_count: usize,
    ) {
        self.player_bets = self.carry_auto_bets(next_round_id);
        self.simulated_bets = simulated_bets(next_round_id, source, simulated_count);
    }

    /// Toggle auto-bet on the panel's latest bet. Returns false if the panel
    /// has no bet.
    pub fn set_repeat(&mut self, panel: PanelId, enabled: bool) -> bool {
        match self.player_bets.iter_mut().rev().find(|b| b.panel() == Some(panel)) {
            Some(bet) => {
                bet.repeat = RepeatPolicy::from_auto_bet(enabled);
                true
            }
            None => false,
        }
    }

    /// Change the stake of a pending bet, settling the difference against
    /// the balance.
    pub fn set_pending_amount(&mut self, panel: PanelId, amount: f64) -> bool {
        if !amount.is_finite() || amount <= 0.0 {
            return false;
        }
        let balance = self.balance;
        let Some(bet) = self
            .player_bets
            .iter_mut()
            .find(|b| b.panel() == Some(panel) && b.status == BetStatus::Pending)
        else {
            return false;
        };

        let delta = amount - bet.amount;
        if delta > balance {
            return false;
        }
        bet.amount = amount;
        self.balance = round2(balance - delta);
        true
    }

    fn bets_mut(&mut self, round_id: RoundId) -> impl Iterator<Item = &mut Bet> + '_ {
        self.player_bets
            .iter_mut()
            .chain(self.simulated_bets.iter_mut())
            .filter(move |b| b.round_id == round_id)
    }

    fn debit(&mut self, amount: f64) {
        self.balance = round2(self.balance - amount);
    }

    fn credit(&mut self, amount: f64) {
        self.balance = round2(self.balance + amount);
    }
}

/// Generate the synthetic opponents for a round.
pub fn simulated_bets(round_id: RoundId, source: &mut dyn UniformSource, count: usize) -> Vec<Bet> {
    (0..count)
        .map(|i| {
            let amount = SIMULATED_STAKES[source.next_index(SIMULATED_STAKES.len())];
            let threshold = round2(source.next_unit() * SIMULATED_CASHOUT_SPAN + SIMULATED_MIN_CASHOUT);
            Bet::pending(
                BetOwner::Simulated { username: format!("d***{}", i + 2) },
                round_id,
                amount,
                Some(threshold),
                RepeatPolicy::Once,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;

    fn auto(threshold: f64) -> BetOptions {
        BetOptions { auto_bet: false, auto_cashout: Some(threshold) }
    }

    #[test]
    fn test_place_debits_balance() {
        let mut ledger = BetLedger::new(100.0);
        let id = ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();
        assert_eq!(ledger.balance(), 90.0);
        let bet = ledger.bet_for_panel(1, 1).unwrap();
        assert_eq!(bet.id, id);
        assert_eq!(bet.status, BetStatus::Pending);
        assert_eq!(bet.round_id, 1);
    }

    #[test]
    fn test_place_rejections_leave_state_untouched() {
        let mut ledger = BetLedger::new(5.0);

        assert_eq!(
            ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()),
            Err(BetRejection::InsufficientBalance { balance: 5.0, amount: 10.0 })
        );
        assert_eq!(
            ledger.place(1, Phase::Running, 1, 1.0, BetOptions::default()),
            Err(BetRejection::WrongPhase(Phase::Running))
        );
        assert_eq!(
            ledger.place(1, Phase::Waiting, 1, 0.0, BetOptions::default()),
            Err(BetRejection::InvalidAmount)
        );
        assert_eq!(
            ledger.place(1, Phase::Waiting, 1, f64::NAN, BetOptions::default()),
            Err(BetRejection::InvalidAmount)
        );
        assert_eq!(
            ledger.place(1, Phase::Waiting, 1, 1.0, auto(1.0)),
            Err(BetRejection::InvalidAutoCashout)
        );

        assert_eq!(ledger.balance(), 5.0);
        assert!(ledger.player_bets().is_empty());
    }

    #[test]
    fn test_duplicate_panel_rejected() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();
        assert_eq!(
            ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()),
            Err(BetRejection::DuplicatePanel(1))
        );
        // Second panel is independent
        assert!(ledger.place(1, Phase::Waiting, 2, 10.0, BetOptions::default()).is_ok());
        assert_eq!(ledger.balance(), 80.0);
    }

    #[test]
    fn test_auto_cashout_before_crash() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, auto(1.5)).unwrap();
        ledger.activate_all(1);

        assert!(ledger.tick_auto_cashouts(1, 1.49, 2.0).is_empty());
        let records = ledger.tick_auto_cashouts(1, 1.52, 2.0);
        assert_eq!(records.len(), 1);
        assert!(records[0].automatic);
        assert_eq!(records[0].multiplier, 1.5);

        let bet = ledger.bet_for_panel(1, 1).unwrap();
        assert_eq!(bet.status, BetStatus::Cashed);
        assert_eq!(bet.cashout_multiplier, Some(1.5));
        assert_eq!(bet.winnings, Some(15.0));
        assert_eq!(ledger.balance(), 105.0);
    }

    #[test]
    fn test_threshold_at_crash_value_loses() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, auto(2.0)).unwrap();
        ledger.activate_all(1);

        assert!(ledger.tick_auto_cashouts(1, 2.0, 2.0).is_empty());
        assert_eq!(ledger.settle_losses(1), 1);
        assert_eq!(ledger.bet_for_panel(1, 1).unwrap().status, BetStatus::Lost);
        assert_eq!(ledger.balance(), 90.0);
    }

    #[test]
    fn test_manual_cashout_is_idempotent() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();
        ledger.activate_all(1);

        let record = ledger.manual_cashout(1, Phase::Running, 1, 1.8).unwrap();
        assert!(!record.automatic);
        assert_eq!(record.winnings, 18.0);
        assert_eq!(ledger.balance(), 108.0);

        assert!(ledger.manual_cashout(1, Phase::Running, 1, 2.5).is_none());
        assert_eq!(ledger.balance(), 108.0);
    }

    #[test]
    fn test_manual_cashout_requires_running_and_active() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();

        // Still pending
        assert!(ledger.manual_cashout(1, Phase::Running, 1, 1.5).is_none());
        ledger.activate_all(1);
        assert!(ledger.manual_cashout(1, Phase::Crashed, 1, 1.5).is_none());
        // Unknown panel
        assert!(ledger.manual_cashout(1, Phase::Running, 9, 1.5).is_none());
        assert_eq!(ledger.balance(), 90.0);
    }

    #[test]
    fn test_manual_cashout_caps_absurd_multiplier() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();
        ledger.activate_all(1);

        let record = ledger.manual_cashout(1, Phase::Running, 1, f64::INFINITY).unwrap();
        assert!(record.winnings.is_finite());
        assert!(ledger.balance().is_finite());
    }

    #[test]
    fn test_carry_auto_bets_debits_and_resets() {
        let mut ledger = BetLedger::new(100.0);
        ledger
            .place(1, Phase::Waiting, 1, 10.0, BetOptions { auto_bet: true, auto_cashout: Some(2.0) })
            .unwrap();
        ledger.place(1, Phase::Waiting, 2, 10.0, BetOptions::default()).unwrap();
        ledger.activate_all(1);
        ledger.settle_losses(1);

        let mut rng = DeterministicRng::new(3);
        ledger.begin_round(2, &mut rng, 0);

        assert_eq!(ledger.player_bets().len(), 1);
        let carried = &ledger.player_bets()[0];
        assert_eq!(carried.round_id, 2);
        assert_eq!(carried.panel(), Some(1));
        assert_eq!(carried.status, BetStatus::Pending);
        assert_eq!(carried.auto_cashout, Some(2.0));
        assert_eq!(ledger.balance(), 70.0);
    }

    #[test]
    fn test_carry_dropped_when_unaffordable() {
        let mut ledger = BetLedger::new(10.0);
        ledger
            .place(1, Phase::Waiting, 1, 10.0, BetOptions { auto_bet: true, auto_cashout: None })
            .unwrap();
        ledger.activate_all(1);
        ledger.settle_losses(1);

        assert!(ledger.carry_auto_bets(2).is_empty());
        assert_eq!(ledger.balance(), 0.0);
    }

    #[test]
    fn test_set_repeat_and_pending_amount() {
        let mut ledger = BetLedger::new(100.0);
        assert!(!ledger.set_repeat(1, true));
        ledger.place(1, Phase::Waiting, 1, 10.0, BetOptions::default()).unwrap();
        assert!(ledger.set_repeat(1, true));
        assert_eq!(ledger.player_bets()[0].repeat, RepeatPolicy::EveryRound);

        assert!(ledger.set_pending_amount(1, 25.0));
        assert_eq!(ledger.balance(), 75.0);
        assert!(ledger.set_pending_amount(1, 5.0));
        assert_eq!(ledger.balance(), 95.0);
        assert!(!ledger.set_pending_amount(1, 500.0));
        assert!(!ledger.set_pending_amount(1, -1.0));

        ledger.activate_all(1);
        assert!(!ledger.set_pending_amount(1, 6.0));
        assert_eq!(ledger.player_bets()[0].amount, 5.0);
    }

    #[test]
    fn test_simulated_bets_shape() {
        let mut rng = DeterministicRng::new(11);
        let bets = simulated_bets(4, &mut rng, 30);
        assert_eq!(bets.len(), 30);
        for (i, bet) in bets.iter().enumerate() {
            assert_eq!(bet.round_id, 4);
            assert_eq!(bet.owner.kind(), OwnerKind::Simulated);
            assert_eq!(bet.owner, BetOwner::Simulated { username: format!("d***{}", i + 2) });
            assert!(SIMULATED_STAKES.contains(&bet.amount));
            let threshold = bet.auto_cashout.unwrap();
            assert!((1.1..=4.1).contains(&threshold));
        }
    }

    #[test]
    fn test_simulated_bets_never_touch_balance() {
        let mut ledger = BetLedger::new(50.0);
        let mut rng = DeterministicRng::new(8);
        ledger.begin_round(1, &mut rng, 30);
        ledger.activate_all(1);

        let records = ledger.tick_auto_cashouts(1, 4.5, 10.0);
        assert_eq!(records.len(), 30);
        assert!(records.iter().all(|r| r.owner == OwnerKind::Simulated));
        assert_eq!(ledger.balance(), 50.0);
    }

    #[test]
    fn test_inert_bets_of_other_rounds() {
        let mut ledger = BetLedger::new(100.0);
        ledger.place(1, Phase::Waiting, 1, 10.0, auto(1.2)).unwrap();
        ledger.activate_all(1);

        // Ticks for another round never touch it
        assert!(ledger.tick_auto_cashouts(2, 5.0, 10.0).is_empty());
        assert_eq!(ledger.settle_losses(2), 0);
        assert_eq!(ledger.bet_for_panel(1, 1).unwrap().status, BetStatus::Active);
    }
}
