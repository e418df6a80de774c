//! Runtime Module
//!
//! Drives a [`RoundEngine`](crate::game::RoundEngine) in real time and
//! exposes it to consumers.
//!
//! ## Module Structure
//!
//! - `driver`: Round loop task and the command handle
//! - `snapshot`: Read model published after every change
//! - `preferences`: Persisted sound preference

pub mod driver;
pub mod preferences;
pub mod snapshot;

pub use driver::{spawn, spawn_with_engine, EngineHandle, COUNTDOWN_STEP};
pub use preferences::{JsonFileStore, MemoryStore, PreferenceError, PreferenceStore, SoundSetting, SOUND_ENABLED_KEY};
pub use snapshot::EngineSnapshot;
