//! # Crash Engine
//!
//! Round lifecycle engine for a crash-style multiplier game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       CRASH ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── rng.rs      - Xorshift128+ PRNG and uniform sources     │
//! │  └── money.rs    - Two-decimal rounding, payout caps         │
//! │                                                              │
//! │  game/           - Round logic (no sleeping, no I/O)         │
//! │  ├── round.rs    - Crash-point generation                    │
//! │  ├── growth.rs   - Multiplier growth model                   │
//! │  ├── bet.rs      - Bet records                               │
//! │  ├── ledger.rs   - Placement, settlement, balance            │
//! │  ├── history.rs  - Bounded crash history                     │
//! │  ├── state.rs    - Phases and phase tokens                   │
//! │  ├── events.rs   - Engine events                             │
//! │  └── engine.rs   - Round state machine                       │
//! │                                                              │
//! │  runtime/        - Real-time driving                         │
//! │  ├── driver.rs   - Round loop task, command handle           │
//! │  ├── snapshot.rs - Published read model                      │
//! │  └── preferences.rs - Sound preference storage               │
//! │                                                              │
//! │  config.rs       - JSON configuration                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round Lifecycle
//!
//! `WAITING` (countdown, bets accepted) → `RUNNING` (multiplier grows,
//! cash-outs accepted) → `CRASHED` (losses settled, history recorded)
//! → next round `WAITING`.
//!
//! The crash value is fixed when a round is generated and is only
//! revealed once the round has crashed. Scheduled steps carry the
//! phase token they were scheduled under; a step whose token no longer
//! matches does nothing.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod runtime;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use crate::core::rng::{DeterministicRng, UniformSource};
pub use game::{BetOptions, EngineEvent, EngineEventData, Phase, PhaseToken, RoundEngine};
pub use runtime::{EngineHandle, EngineSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
