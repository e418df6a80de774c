//! Round Engine
//!
//! The authoritative state machine: `Waiting -> Running -> Crashed -> Waiting`.
//!
//! The engine never sleeps and takes all timing from the instants it is
//! handed; the wall clock is read only to stamp rounds for display. The
//! scheduler calls one step per wake-up and passes the [`PhaseToken`] it
//! captured when it went to sleep:
//!
//! - `countdown_tick` once per second while waiting
//! - `growth_tick` once per frame while running
//! - `complete_settlement` once, after the settle delay, when crashed
//!
//! A step whose token no longer matches is a no-op.

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::core::money::round2;
use crate::core::rng::{DeterministicRng, UniformSource};
use crate::game::bet::{Bet, BetOptions, PanelId};
use crate::game::events::{EngineEvent, EngineEventData};
use crate::game::growth::GrowthParams;
use crate::game::history::HistoryLog;
use crate::game::ledger::BetLedger;
use crate::game::round::{CrashPointGenerator, Round, RoundId};
use crate::game::state::{Phase, PhaseToken};

/// Result of one engine step.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated by this step
    pub events: Vec<EngineEvent>,
    /// Whether the phase changed
    pub phase_changed: bool,
    /// The step's token was stale; nothing happened
    pub stale: bool,
}

impl TickResult {
    fn stale() -> Self {
        Self {
            stale: true,
            ..Default::default()
        }
    }
}

/// The round lifecycle engine.
pub struct RoundEngine {
    phase: Phase,
    countdown: u32,
    round_wait_seconds: u32,
    live_multiplier: f64,
    round: Round,
    started_at: Option<Instant>,
    crashed_at: Option<DateTime<Utc>>,
    growth: GrowthParams,
    generator: CrashPointGenerator,
    source: Box<dyn UniformSource + Send>,
    ledger: BetLedger,
    history: HistoryLog,
    simulated_bettors: usize,
    events: Vec<EngineEvent>,
}

impl RoundEngine {
    /// Create an engine in `Waiting` with the first round generated.
    ///
    /// Seeds from `config.rng_seed`, or from the clock when absent.
    pub fn new(config: &EngineConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => DeterministicRng::new(seed),
            None => DeterministicRng::from_clock(),
        };
        Self::with_source(config, Box::new(rng))
    }

    /// Create an engine drawing all randomness from `source`.
    pub fn with_source(config: &EngineConfig, mut source: Box<dyn UniformSource + Send>) -> Self {
        let mut generator = CrashPointGenerator::new(config.crash);
        let round = generator.generate(source.as_mut());
        let mut ledger = BetLedger::new(config.starting_balance);
        ledger.begin_round(round.id(), source.as_mut(), config.simulated_bettors);

        let round_wait_seconds = config.round_wait_seconds.max(1);
        let mut engine = Self {
            phase: Phase::Waiting,
            countdown: round_wait_seconds,
            round_wait_seconds,
            live_multiplier: 1.0,
            round,
            started_at: None,
            crashed_at: None,
            growth: config.growth,
            generator,
            source,
            ledger,
            history: HistoryLog::new(config.history_capacity),
            simulated_bettors: config.simulated_bettors,
            events: Vec::new(),
        };
        engine.push_event(EngineEventData::RoundOpened { countdown: round_wait_seconds });
        info!("Round {} open, countdown {}s", engine.round.id(), round_wait_seconds);
        engine
    }

    // =========================================================================
    // Read surface
    // =========================================================================

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Token a scheduler should capture before sleeping.
    pub fn token(&self) -> PhaseToken {
        PhaseToken {
            round_id: self.round.id(),
            phase: self.phase,
        }
    }

    /// Current round id.
    pub fn round_id(&self) -> RoundId {
        self.round.id()
    }

    /// When the current round was generated.
    pub fn round_created_at(&self) -> DateTime<Utc> {
        self.round.created_at()
    }

    /// When the current round crashed, once it has.
    pub fn crashed_at(&self) -> Option<DateTime<Utc>> {
        self.crashed_at
    }

    /// Seconds left in the countdown.
    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    /// Live multiplier (two decimals).
    pub fn live_multiplier(&self) -> f64 {
        self.live_multiplier
    }

    /// The crash value, revealed only once the round has crashed.
    pub fn revealed_crash_value(&self) -> Option<f64> {
        match self.phase {
            Phase::Crashed => Some(self.round.crash_value()),
            _ => None,
        }
    }

    /// Crash history.
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Player balance.
    pub fn balance(&self) -> f64 {
        self.ledger.balance()
    }

    /// The player's bets.
    pub fn player_bets(&self) -> &[Bet] {
        self.ledger.player_bets()
    }

    /// The simulated opponents' bets.
    pub fn simulated_bets(&self) -> &[Bet] {
        self.ledger.simulated_bets()
    }

    /// Current growth tunables.
    pub fn growth(&self) -> GrowthParams {
        self.growth
    }

    /// Countdown length used when the next round opens.
    pub fn round_wait_seconds(&self) -> u32 {
        self.round_wait_seconds
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // =========================================================================
    // Scheduled steps
    // =========================================================================

    /// One-second countdown step. Starts the round when it reaches zero.
    pub fn countdown_tick(&mut self, token: PhaseToken, now: Instant) -> TickResult {
        if !self.owns(token, Phase::Waiting) {
            return TickResult::stale();
        }

        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown > 0 {
            self.push_event(EngineEventData::Countdown { seconds: self.countdown });
            return self.finish(false);
        }

        let activated = self.ledger.activate_all(self.round.id());
        self.started_at = Some(now);
        self.live_multiplier = 1.0;
        self.set_phase(Phase::Running);
        info!("Round {} running with {} active bets", self.round.id(), activated);
        self.finish(true)
    }

    /// Frame step while running: grow, settle auto-cashouts, then check
    /// for the crash.
    pub fn growth_tick(&mut self, token: PhaseToken, now: Instant) -> TickResult {
        if !self.owns(token, Phase::Running) {
            return TickResult::stale();
        }

        let started = *self.started_at.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let crash_value = self.round.crash_value();

        let computed = round2(self.growth.value_at(elapsed).min(crash_value));
        // Tunables may drop mid-round; the live value never moves backwards
        self.live_multiplier = computed.max(self.live_multiplier).min(crash_value);

        // 1. Auto cash-outs see this tick's value first
        let round_id = self.round.id();
        for record in self.ledger.tick_auto_cashouts(round_id, self.live_multiplier, crash_value) {
            self.events.push(EngineEvent::cashed_out(round_id, record));
        }

        // 2. Crash check
        if self.live_multiplier >= crash_value {
            self.crash(crash_value);
            return self.finish(true);
        }
        self.finish(false)
    }

    /// Close out a crashed round and open the next one.
    pub fn complete_settlement(&mut self, token: PhaseToken) -> TickResult {
        if !self.owns(token, Phase::Crashed) {
            return TickResult::stale();
        }

        self.round = self.generator.generate(self.source.as_mut());
        self.ledger
            .begin_round(self.round.id(), self.source.as_mut(), self.simulated_bettors);

        self.countdown = self.round_wait_seconds;
        self.live_multiplier = 1.0;
        self.started_at = None;
        self.crashed_at = None;
        self.set_phase(Phase::Waiting);
        self.push_event(EngineEventData::RoundOpened { countdown: self.countdown });
        info!(
            "Round {} open, countdown {}s, {} auto-bets carried",
            self.round.id(),
            self.countdown,
            self.ledger.player_bets().len()
        );
        self.finish(true)
    }

    fn crash(&mut self, crash_value: f64) {
        let round_id = self.round.id();
        let lost_bets = self.ledger.settle_losses(round_id);
        self.history.record(round_id, crash_value);
        self.crashed_at = Some(Utc::now());
        self.set_phase(Phase::Crashed);
        self.push_event(EngineEventData::Crashed { crash_value, lost_bets });
        info!("Round {} crashed at {:.2}x ({} bets lost)", round_id, crash_value, lost_bets);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Place a bet on `panel`. Returns false on any refusal, with no effect.
    pub fn place_bet(&mut self, panel: PanelId, amount: f64, options: BetOptions) -> bool {
        match self.ledger.place(self.round.id(), self.phase, panel, amount, options) {
            Ok(bet_id) => {
                self.push_event(EngineEventData::BetPlaced { panel, bet_id, amount });
                debug!("Bet {:.2} placed on panel {} for round {}", amount, panel, self.round.id());
                true
            }
            Err(rejection) => {
                debug!("Bet on panel {} rejected: {}", panel, rejection);
                false
            }
        }
    }

    /// Cash out the panel's active bet at the live multiplier.
    ///
    /// Returns whether anything happened; ineligible calls are no-ops.
    pub fn cash_out(&mut self, panel: PanelId) -> bool {
        let round_id = self.round.id();
        match self
            .ledger
            .manual_cashout(round_id, self.phase, panel, self.live_multiplier)
        {
            Some(record) => {
                debug!("Panel {} cashed out at {:.2}x", panel, record.multiplier);
                self.events.push(EngineEvent::cashed_out(round_id, record));
                true
            }
            None => false,
        }
    }

    /// Toggle auto-bet on the panel's bet.
    pub fn set_auto_bet(&mut self, panel: PanelId, enabled: bool) {
        if !self.ledger.set_repeat(panel, enabled) {
            debug!("No bet on panel {} to toggle auto-bet", panel);
        }
    }

    /// Change the stake of the panel's pending bet.
    pub fn set_bet_amount(&mut self, panel: PanelId, amount: f64) {
        if !self.ledger.set_pending_amount(panel, amount) {
            debug!("Stake change to {} on panel {} ignored", amount, panel);
        }
    }

    /// Shift the growth rate; applies from the next tick.
    pub fn adjust_growth_rate(&mut self, delta: f64) {
        self.growth.adjust_rate(delta);
        info!("Growth rate now {}", self.growth.rate);
    }

    /// Shift the growth exponent; applies from the next tick.
    pub fn adjust_growth_exponent(&mut self, delta: f64) {
        self.growth.adjust_exponent(delta);
        info!("Growth exponent now {}", self.growth.exponent);
    }

    /// Shift the countdown length (minimum one second); applies when the
    /// next round opens.
    pub fn adjust_round_wait(&mut self, delta: i32) {
        let next = (self.round_wait_seconds as i64 + delta as i64).max(1);
        self.round_wait_seconds = next.min(u32::MAX as i64) as u32;
        info!("Round wait now {}s", self.round_wait_seconds);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn owns(&self, token: PhaseToken, expected: Phase) -> bool {
        let current = self.token();
        if token != current || current.phase != expected {
            debug!("Ignoring stale {} step for round {}", token.phase, token.round_id);
            return false;
        }
        true
    }

    fn set_phase(&mut self, next: Phase) {
        let previous = self.phase;
        self.phase = next;
        self.events.push(EngineEvent::phase_changed(self.round.id(), previous, next));
    }

    fn push_event(&mut self, data: EngineEventData) {
        self.events.push(EngineEvent::new(self.round.id(), data));
    }

    fn finish(&mut self, phase_changed: bool) -> TickResult {
        TickResult {
            events: self.take_events(),
            phase_changed,
            stale: false,
        }
    }
}
