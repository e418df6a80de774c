//! Round Driver
//!
//! Owns the clock. A single task walks the engine through its phases:
//! one-second countdown steps, frame-rate growth steps, then the settle
//! delay. Every step carries the phase token captured when it was
//! scheduled, so a step that outlives its phase is dropped by the engine.
//!
//! Commands go through [`EngineHandle`], which takes the same lock the
//! loop does; engine state is never touched concurrently.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::game::bet::{BetOptions, PanelId};
use crate::game::engine::RoundEngine;
use crate::game::events::EngineEvent;
use crate::game::state::Phase;
use crate::runtime::preferences::{PreferenceStore, SoundSetting};
use crate::runtime::snapshot::EngineSnapshot;

/// Countdown step.
pub const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

/// Event channel capacity; slow subscribers lag rather than block the loop.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Timings the loop runs on.
#[derive(Clone, Copy, Debug)]
struct LoopTiming {
    frame_interval: Duration,
    settle_delay: Duration,
}

/// Command and read interface to a running engine.
///
/// Cheap to clone; all clones drive the same engine.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<Mutex<RoundEngine>>,
    snapshots: Arc<watch::Sender<EngineSnapshot>>,
    events: broadcast::Sender<EngineEvent>,
    shutdown: broadcast::Sender<()>,
    sound: Arc<Mutex<SoundSetting>>,
}

impl EngineHandle {
    // =========================================================================
    // Commands
    // =========================================================================

    /// Place a bet. Returns whether it was accepted.
    pub async fn place_bet(&self, panel: PanelId, amount: f64, options: BetOptions) -> bool {
        self.command(|engine| engine.place_bet(panel, amount, options)).await
    }

    /// Cash out the panel's active bet. Returns whether it paid out.
    pub async fn cash_out(&self, panel: PanelId) -> bool {
        self.command(|engine| engine.cash_out(panel)).await
    }

    /// Toggle auto-bet for the panel.
    pub async fn set_auto_bet(&self, panel: PanelId, enabled: bool) {
        self.command(|engine| engine.set_auto_bet(panel, enabled)).await
    }

    /// Change the panel's pending stake.
    pub async fn set_bet_amount(&self, panel: PanelId, amount: f64) {
        self.command(|engine| engine.set_bet_amount(panel, amount)).await
    }

    /// Shift the growth rate.
    pub async fn adjust_growth_rate(&self, delta: f64) {
        self.command(|engine| engine.adjust_growth_rate(delta)).await
    }

    /// Shift the growth exponent.
    pub async fn adjust_growth_exponent(&self, delta: f64) {
        self.command(|engine| engine.adjust_growth_exponent(delta)).await
    }

    /// Shift the countdown length for upcoming rounds.
    pub async fn adjust_round_wait(&self, delta: i32) {
        self.command(|engine| engine.adjust_round_wait(delta)).await
    }

    /// Toggle sound. Never fails; storage problems are logged.
    pub async fn set_sound_enabled(&self, enabled: bool) {
        self.sound.lock().await.set_enabled(enabled);
    }

    /// Ask the loop to stop after its current step.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Latest snapshot.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.snapshots.subscribe()
    }

    /// Receiver for engine events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Current sound flag.
    pub async fn sound_enabled(&self) -> bool {
        self.sound.lock().await.enabled()
    }

    async fn command<T>(&self, f: impl FnOnce(&mut RoundEngine) -> T) -> T {
        let mut engine = self.engine.lock().await;
        let out = f(&mut engine);
        let events = engine.take_events();
        publish(&engine, events, &self.snapshots, &self.events);
        out
    }
}

/// Start a driver for a fresh engine built from `config`.
pub fn spawn(config: &EngineConfig, store: Box<dyn PreferenceStore>) -> (EngineHandle, JoinHandle<()>) {
    spawn_with_engine(RoundEngine::new(config), config, store)
}

/// Start a driver for an existing engine. Timings come from `config`.
pub fn spawn_with_engine(
    mut engine: RoundEngine,
    config: &EngineConfig,
    store: Box<dyn PreferenceStore>,
) -> (EngineHandle, JoinHandle<()>) {
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Events from construction are folded into the first snapshot only
    engine.take_events();
    let (snapshot_tx, _) = watch::channel(EngineSnapshot::capture(&engine));

    let handle = EngineHandle {
        engine: Arc::new(Mutex::new(engine)),
        snapshots: Arc::new(snapshot_tx),
        events: event_tx,
        shutdown: shutdown_tx,
        sound: Arc::new(Mutex::new(SoundSetting::load(store))),
    };

    let timing = LoopTiming {
        frame_interval: config.frame_interval(),
        settle_delay: config.settle_delay(),
    };
    let task = tokio::spawn(run_round_loop(handle.clone(), timing, shutdown_rx));
    (handle, task)
}

async fn run_round_loop(handle: EngineHandle, timing: LoopTiming, mut shutdown: broadcast::Receiver<()>) {
    info!("Round loop started");
    let mut frames: Option<Interval> = None;

    loop {
        let token = handle.engine.lock().await.token();
        if token.phase != Phase::Running {
            frames = None;
        }

        tokio::select! {
            _ = shutdown.recv() => {
                info!("Round loop shutting down");
                break;
            }
            _ = wait_for_step(token.phase, &mut frames, timing) => {}
        }

        let mut engine = handle.engine.lock().await;
        let now = Instant::now();
        let result = match token.phase {
            Phase::Waiting => engine.countdown_tick(token, now),
            Phase::Running => engine.growth_tick(token, now),
            Phase::Crashed => engine.complete_settlement(token),
        };

        if result.stale {
            continue;
        }
        if result.phase_changed {
            debug!("Round {} now {}", engine.round_id(), engine.phase());
        }
        publish(&engine, result.events, &handle.snapshots, &handle.events);
    }
}

async fn wait_for_step(phase: Phase, frames: &mut Option<Interval>, timing: LoopTiming) {
    match phase {
        Phase::Waiting => sleep(COUNTDOWN_STEP).await,
        Phase::Crashed => sleep(timing.settle_delay).await,
        Phase::Running => {
            let ticker = frames.get_or_insert_with(|| {
                let mut ticker = interval(timing.frame_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });
            ticker.tick().await;
        }
    }
}

fn publish(
    engine: &RoundEngine,
    events: Vec<EngineEvent>,
    snapshots: &watch::Sender<EngineSnapshot>,
    event_tx: &broadcast::Sender<EngineEvent>,
) {
    for event in events {
        // No subscribers is fine
        let _ = event_tx.send(event);
    }
    snapshots.send_replace(EngineSnapshot::capture(engine));
}
