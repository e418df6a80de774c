//! Rounds and Crash-Point Generation
//!
//! A round's crash value is drawn once, up front, from a heavy-tailed
//! distribution and never changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use crate::core::money::round2;
use crate::core::rng::UniformSource;

/// Highest crash value any round can have, whatever the params say.
pub const MAX_CRASH_VALUE: f64 = 100.0;

/// Round identifier. Strictly increasing, starting at 1.
pub type RoundId = u64;

/// Shape of the crash-value distribution.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashParams {
    /// Tail exponent applied to `1 / (1 - r)`.
    pub exponent: f64,
    /// Constant added after the power.
    pub offset: f64,
    /// Hard upper clamp.
    pub max_value: f64,
}

impl Default for CrashParams {
    fn default() -> Self {
        Self {
            exponent: 0.35,
            offset: 0.9,
            max_value: 100.0,
        }
    }
}

/// One round of the game.
///
/// The crash value is crate-private: consumers see it only
/// through the engine once the round has crashed.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    id: RoundId,
    pub(crate) crash_value: f64,
    created_at: DateTime<Utc>,
}

impl Round {
    /// Round identifier.
    pub fn id(&self) -> RoundId {
        self.id
    }

    /// When the round was generated.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn crash_value(&self) -> f64 {
        self.crash_value
    }
}

/// Map a uniform draw `r` in `[0, 1)` to a crash value.
///
/// `min(max_value, (1 / (1 - r))^exponent + offset)`, rounded to two
/// decimals and kept within `[1.0, MAX_CRASH_VALUE]`.
pub fn crash_value_from_unit(r: f64, params: &CrashParams) -> f64 {
    let r = if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 };
    let raw = (1.0 / (1.0 - r)).powf(params.exponent) + params.offset;
    // r == 1.0 or a huge exponent gives inf; the clamp takes care of it
    let ceiling = params.max_value.min(MAX_CRASH_VALUE);
    let bounded = if raw.is_nan() { 1.0 } else { raw.min(ceiling) };
    round2(bounded).max(1.0)
}

/// Produces successive rounds.
#[derive(Clone, Debug, Default)]
pub struct CrashPointGenerator {
    params: CrashParams,
    last_round_id: RoundId,
}

impl CrashPointGenerator {
    /// Create a generator whose first round will be id 1.
    pub fn new(params: CrashParams) -> Self {
        Self {
            params,
            last_round_id: 0,
        }
    }

    /// Generate the next round.
    pub fn generate(&mut self, source: &mut dyn UniformSource) -> Round {
        self.last_round_id += 1;
        let crash_value = crash_value_from_unit(source.next_unit(), &self.params);
        Round {
            id: self.last_round_id,
            crash_value,
            created_at: Utc::now(),
        }
    }

    /// Id of the most recently generated round (0 before the first).
    pub fn last_round_id(&self) -> RoundId {
        self.last_round_id
    }

    /// Distribution parameters.
    pub fn params(&self) -> &CrashParams {
        &self.params
    }
}
