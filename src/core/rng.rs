//! Deterministic Random Number Generator
//!
//! Uses Xorshift128+ for fast, reproducible randomness.
//! Given the same seed, produces the identical sequence of rounds and
//! simulated bets on every platform.

/// A source of uniform values in `[0, 1)`.
///
/// Every random draw in the engine goes through this trait, so tests can
/// swap in a scripted source and pin exact crash values.
pub trait UniformSource {
    /// Next uniform value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in `[0, max)`. Returns 0 when `max == 0`.
    fn next_index(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        ((self.next_unit() * max as f64) as usize).min(max - 1)
    }
}

/// Deterministic PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use crash_engine::core::rng::{DeterministicRng, UniformSource};
///
/// let mut a = DeterministicRng::new(12345);
/// let mut b = DeterministicRng::new(12345);
/// assert_eq!(a.next_unit(), b.next_unit());
/// ```
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl DeterministicRng {
    /// Seed the generator. The state is expanded with SplitMix64, so
    /// small consecutive seeds still give unrelated sequences.
    pub fn new(seed: u64) -> Self {
        let mut mix = seed;
        let state = [splitmix64(&mut mix), splitmix64(&mut mix)];
        // Xorshift never leaves the all-zero state
        if state == [0, 0] {
            return Self { state: [1, 1] };
        }
        Self { state }
    }

    /// Create an RNG seeded from the wall clock.
    pub fn from_clock() -> Self {
        let now = chrono::Utc::now();
        let seed = (now.timestamp() as u64)
            .wrapping_mul(1_000_000_000)
            .wrapping_add(now.timestamp_subsec_nanos() as u64);
        Self::new(seed)
    }

    /// Next raw 64-bit value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [a, b] = self.state;
        let out = a.wrapping_add(b);
        let mixed = b ^ a;
        self.state = [a.rotate_left(24) ^ mixed ^ (mixed << 16), mixed.rotate_left(37)];
        out
    }
}

impl UniformSource for DeterministicRng {
    /// Top 53 bits of the next value, scaled into `[0, 1)`.
    #[inline]
    fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }
}

#[inline]
fn splitmix64(counter: &mut u64) -> u64 {
    *counter = counter.wrapping_add(0x9E3779B97F4A7C15);
    let mut x = *counter;
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

/// Replays a fixed list of unit values, cycling when exhausted.
///
/// Handy for pinning crash values in tests and demos.
#[derive(Clone, Debug)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    /// Create from a list of values; each is clamped into `[0, 1)`.
    pub fn new(values: Vec<f64>) -> Self {
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 0.999_999_999) } else { 0.0 })
            .collect();
        Self { values, cursor: 0 }
    }
}

impl UniformSource for ScriptedSource {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_rounds() {
        let mut a = DeterministicRng::new(2024);
        let mut b = DeterministicRng::new(2024);
        let draws_a: Vec<f64> = (0..500).map(|_| a.next_unit()).collect();
        let draws_b: Vec<f64> = (0..500).map(|_| b.next_unit()).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn test_neighbouring_seeds_diverge() {
        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(8);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn test_unit_draws_stay_below_one() {
        let mut rng = DeterministicRng::new(31);
        for _ in 0..10_000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_stake_index_in_menu() {
        let mut rng = DeterministicRng::new(99);
        let mut seen = [false; 5];
        for _ in 0..1000 {
            seen[rng.next_index(5)] = true;
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(rng.next_index(0), 0);
        assert_eq!(rng.next_index(1), 0);
    }

    #[test]
    fn test_clock_seeded_sources_work() {
        let mut rng = DeterministicRng::from_clock();
        assert!(rng.next_unit() < 1.0);
    }

    #[test]
    fn test_scripted_source_cycles() {
        let mut source = ScriptedSource::new(vec![0.25, 0.5]);
        assert_eq!(source.next_unit(), 0.25);
        assert_eq!(source.next_unit(), 0.5);
        assert_eq!(source.next_unit(), 0.25);

        let mut clamped = ScriptedSource::new(vec![1.5, f64::NAN]);
        assert!(clamped.next_unit() < 1.0);
        assert_eq!(clamped.next_unit(), 0.0);

        let mut empty = ScriptedSource::new(Vec::new());
        assert_eq!(empty.next_unit(), 0.0);
    }
}
