//! Core primitives.
//!
//! Seeded randomness and the two-decimal arithmetic every settlement
//! and comparison in the engine goes through.

pub mod money;
pub mod rng;

// Re-export core types
pub use money::{round2, payout, sanitize_multiplier, MAX_PAYOUT, MULTIPLIER_CEILING};
pub use rng::{DeterministicRng, ScriptedSource, UniformSource};
