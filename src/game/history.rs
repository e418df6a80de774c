//! Crash History
//!
//! Most-recent-first record of finished rounds. Append and truncate only.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

use crate::core::money::format_multiplier;
use crate::game::round::RoundId;

/// Default number of rounds kept.
pub const HISTORY_CAPACITY: usize = 16;

/// One finished round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Round that crashed.
    pub round_id: RoundId,
    /// Where it crashed.
    pub crash_value: f64,
}

impl std::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_multiplier(self.crash_value))
    }
}

/// Bounded crash history.
#[derive(Clone, Debug)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryLog {
    /// Create an empty log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a finished round to the front, evicting the oldest if full.
    pub fn record(&mut self, round_id: RoundId, crash_value: f64) {
        self.entries.push_front(HistoryEntry { round_id, crash_value });
        self.entries.truncate(self.capacity);
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Display labels such as `"2.00x"`, most recent first.
    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(ToString::to_string).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No rounds recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_most_recent_first() {
        let mut log = HistoryLog::default();
        assert!(log.is_empty());
        log.record(1, 1.9);
        log.record(2, 12.5);
        assert_eq!(log.labels(), vec!["12.50x".to_string(), "1.90x".to_string()]);
    }

    #[test]
    fn test_keeps_sixteen_of_twenty() {
        let mut log = HistoryLog::default();
        for round in 1..=20u64 {
            log.record(round, round as f64);
        }
        assert_eq!(log.len(), 16);
        let ids: Vec<RoundId> = log.entries().map(|e| e.round_id).collect();
        assert_eq!(ids, (5..=20).rev().collect::<Vec<_>>());
        assert_eq!(log.labels()[0], "20.00x");
    }

    proptest! {
        #[test]
        fn never_exceeds_capacity(capacity in 1usize..32, pushes in 0usize..100) {
            let mut log = HistoryLog::new(capacity);
            for i in 0..pushes {
                log.record(i as u64 + 1, 2.0);
            }
            prop_assert_eq!(log.len(), pushes.min(capacity));
        }
    }
}
