//! Multiplier Growth Model
//!
//! `1 + (elapsed * rate)^exponent`. The model itself grows without bound;
//! the engine clamps to the crash value and rounds before comparing.

use serde::{Serialize, Deserialize};

use crate::core::money::sanitize_multiplier;

/// Lowest growth rate reachable through runtime tuning.
pub const MIN_GROWTH_RATE: f64 = 0.01;

/// Lowest growth exponent reachable through runtime tuning.
pub const MIN_GROWTH_EXPONENT: f64 = 0.2;

/// Runtime-tunable growth parameters.
///
/// Not versioned per round: a change is picked up by the very next tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthParams {
    /// Time scale applied before the power.
    pub rate: f64,
    /// Curve exponent.
    pub exponent: f64,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            rate: 0.20,
            exponent: 0.90,
        }
    }
}

impl GrowthParams {
    /// Shift the rate by `delta` (4 decimals, floored at `MIN_GROWTH_RATE`).
    pub fn adjust_rate(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.rate = round_to(self.rate + delta, 4).max(MIN_GROWTH_RATE);
    }

    /// Shift the exponent by `delta` (3 decimals, floored at `MIN_GROWTH_EXPONENT`).
    pub fn adjust_exponent(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        self.exponent = round_to(self.exponent + delta, 3).max(MIN_GROWTH_EXPONENT);
    }

    /// Multiplier at `elapsed_seconds` under these parameters.
    pub fn value_at(&self, elapsed_seconds: f64) -> f64 {
        value_at(elapsed_seconds, self.rate, self.exponent)
    }
}

/// Raw multiplier after `elapsed_seconds`.
///
/// Floored at 1.0; non-finite results are pulled back to the multiplier
/// ceiling so they can never reach a balance.
pub fn value_at(elapsed_seconds: f64, growth_rate: f64, growth_exponent: f64) -> f64 {
    let scaled = elapsed_seconds * growth_rate;
    if scaled.is_nan() || scaled <= 0.0 {
        return 1.0;
    }
    sanitize_multiplier(1.0 + scaled.powf(growth_exponent))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
