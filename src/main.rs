//! Crash Engine
//!
//! Runs the round engine in real time with a scripted player: one panel
//! on auto-bet with an auto cash-out, one panel cashed out by hand.
//!
//! Usage: `crash-engine [config.json] [preferences.json]`

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crash_engine::{
    VERSION,
    config::EngineConfig,
    game::{BetOptions, EngineEvent, EngineEventData, Phase},
    runtime::{self, EngineHandle, JsonFileStore, MemoryStore, PreferenceStore},
};

/// Rounds to play before exiting.
const DEMO_ROUNDS: usize = 3;

/// Multiplier at which the manual panel cashes out.
const MANUAL_TARGET: f64 = 1.3;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Crash Engine v{}", VERSION);

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => EngineConfig::from_json_file(&path)
            .with_context(|| format!("loading config from {}", path))?,
        None => EngineConfig::default(),
    };
    let store: Box<dyn PreferenceStore> = match args.next() {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    };

    info!(
        "Starting balance {:.2}, countdown {}s, growth rate {} exponent {}",
        config.starting_balance, config.round_wait_seconds, config.growth.rate, config.growth.exponent
    );

    let (handle, task) = runtime::spawn(&config, store);
    info!("Sound {}", if handle.sound_enabled().await { "on" } else { "off" });

    let outcome = play(&handle, DEMO_ROUNDS).await;

    handle.shutdown();
    task.await.context("round loop task failed")?;
    outcome?;

    let snapshot = handle.snapshot();
    info!("Final balance {:.2}", snapshot.balance);
    info!("History: {}", snapshot.history.join(" "));
    Ok(())
}

fn init_tracing() {
    let default_level = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Play `rounds` rounds, logging every event.
async fn play(handle: &EngineHandle, rounds: usize) -> Result<()> {
    let mut events = handle.subscribe_events();
    let mut snapshots = handle.subscribe();

    let auto = BetOptions {
        auto_bet: true,
        auto_cashout: Some(1.5),
    };
    if !handle.place_bet(1, 10.0, auto).await {
        warn!("Auto-bet on panel 1 was refused");
    }
    let mut manual_armed = handle.place_bet(2, 25.0, BetOptions::default()).await;

    let mut crashed = 0;
    while crashed < rounds {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    log_event(&event);
                    match event.data {
                        EngineEventData::Crashed { .. } => crashed += 1,
                        EngineEventData::RoundOpened { .. } => {
                            manual_armed = handle.place_bet(2, 25.0, BetOptions::default()).await;
                        }
                        _ => {}
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!("Event stream lagged, {} events skipped", skipped),
                Err(RecvError::Closed) => break,
            },
            changed = snapshots.changed() => {
                changed.context("round loop stopped")?;
                let reached = {
                    let snapshot = snapshots.borrow_and_update();
                    snapshot.phase == Phase::Running && snapshot.live_multiplier >= MANUAL_TARGET
                };
                if manual_armed && reached {
                    handle.cash_out(2).await;
                    manual_armed = false;
                }
            }
        }
    }
    Ok(())
}

fn log_event(event: &EngineEvent) {
    match &event.data {
        EngineEventData::RoundOpened { countdown } => {
            info!("Round {} open, {}s to start", event.round_id, countdown)
        }
        EngineEventData::Countdown { seconds } => info!("{}...", seconds),
        EngineEventData::BetPlaced { panel, amount, .. } => {
            info!("Bet {:.2} on panel {}", amount, panel)
        }
        EngineEventData::PhaseChanged { from, to } => info!("{} -> {}", from, to),
        EngineEventData::CashedOut(record) => {
            // Simulated cash-outs are too chatty to log
            if let Some(panel) = record.panel {
                info!(
                    "Panel {} cashed out at {:.2}x for {:.2}{}",
                    panel,
                    record.multiplier,
                    record.winnings,
                    if record.automatic { " (auto)" } else { "" }
                );
            }
        }
        EngineEventData::Crashed { crash_value, lost_bets } => {
            info!("Crashed at {:.2}x, {} bets lost", crash_value, lost_bets)
        }
    }
}
