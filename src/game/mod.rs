//! Game Logic Module
//!
//! Everything that decides the outcome of a round. No sleeping and no I/O:
//! the runtime layer feeds in instants and phase tokens, and all timing
//! decisions come from those. Wall-clock timestamps (`created_at`,
//! `crashed_at`) are recorded for display only and never drive a step.
//!
//! ## Module Structure
//!
//! - `round`: Crash-point generation
//! - `growth`: Multiplier growth model and tunables
//! - `bet`: Bet records and lifecycle
//! - `ledger`: Bet placement, settlement and balance
//! - `history`: Bounded crash history
//! - `state`: Phase and phase tokens
//! - `engine`: The round state machine
//! - `events`: Events emitted by engine steps

pub mod bet;
pub mod engine;
pub mod events;
pub mod growth;
pub mod history;
pub mod ledger;
pub mod round;
pub mod state;

// Re-export key types
pub use bet::{Bet, BetId, BetOptions, BetOwner, BetStatus, OwnerKind, PanelId, RepeatPolicy};
pub use engine::{RoundEngine, TickResult};
pub use events::{EngineEvent, EngineEventData};
pub use growth::GrowthParams;
pub use history::{HistoryEntry, HistoryLog};
pub use ledger::{BetLedger, BetRejection};
pub use round::{CrashParams, CrashPointGenerator, Round, RoundId};
pub use state::{Phase, PhaseToken};
