//! Run records ledger
//!
//! Completed levels, the seed each level was first cleared with, and best
//! race times. Fed from simulation events; stored as JSON by the host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::events::GameEvent;

/// Failure to read a stored ledger
#[derive(Debug, Error)]
pub enum RecordsError {
    #[error("malformed records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent progress across sessions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunRecords {
    /// Fastest finish in seconds, keyed by `race_<rounds>` / `speedrun_50`
    pub best_times: BTreeMap<String, f32>,
    /// Seed a level was first completed with; replaying uses it again
    pub level_seeds: BTreeMap<u32, u32>,
    /// Completed classic levels, ascending, no duplicates
    pub completed_levels: Vec<u32>,
    /// Highest completed classic level
    pub max_level: u32,
}

impl RunRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one simulation event into the ledger
    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::LevelComplete { level, seed, .. } => {
                self.record_level_completion(*level, *seed);
            }
            GameEvent::RaceComplete {
                mode, total_time, ..
            } => {
                if let Some(key) = mode.record_key() {
                    self.record_race_time(&key, *total_time);
                }
            }
            _ => {}
        }
    }

    /// Mark `level` completed; the first recorded seed is kept
    pub fn record_level_completion(&mut self, level: u32, seed: u32) {
        if level == 0 {
            return;
        }
        self.level_seeds.entry(level).or_insert(seed);
        if let Err(pos) = self.completed_levels.binary_search(&level) {
            self.completed_levels.insert(pos, level);
        }
        self.max_level = self.max_level.max(level);
    }

    /// Keep `time` if it beats the stored best. Returns true on a new best.
    pub fn record_race_time(&mut self, key: &str, time: f32) -> bool {
        if !time.is_finite() || time <= 0.0 {
            return false;
        }
        match self.best_times.get(key) {
            Some(&best) if best <= time => false,
            _ => {
                self.best_times.insert(key.to_string(), time);
                log::info!("New best for {}: {:.2}s", key, time);
                true
            }
        }
    }

    pub fn best_time(&self, key: &str) -> Option<f32> {
        self.best_times.get(key).copied()
    }

    pub fn seed_for_level(&self, level: u32) -> Option<u32> {
        self.level_seeds.get(&level).copied()
    }

    pub fn is_completed(&self, level: u32) -> bool {
        self.completed_levels.binary_search(&level).is_ok()
    }

    /// Drop entries a well-behaved ledger can't contain
    pub fn sanitize(&mut self) {
        self.best_times.retain(|_, t| t.is_finite() && *t > 0.0);
        self.level_seeds.retain(|level, seed| *level > 0 && *seed > 0);
        self.completed_levels.retain(|&level| level > 0);
        self.completed_levels.sort_unstable();
        self.completed_levels.dedup();
        if let Some(&highest) = self.completed_levels.last() {
            self.max_level = self.max_level.max(highest);
        }
    }

    pub fn to_json(&self) -> Result<String, RecordsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and sanitize a stored ledger
    pub fn from_json(json: &str) -> Result<Self, RecordsError> {
        let mut records: RunRecords = serde_json::from_str(json)?;
        records.sanitize();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::GameMode;

    #[test]
    fn test_first_seed_wins() {
        let mut records = RunRecords::new();
        records.apply(&GameEvent::LevelComplete {
            level: 4,
            seed: 111,
            reward: 10,
        });
        records.apply(&GameEvent::LevelComplete {
            level: 4,
            seed: 222,
            reward: 10,
        });
        assert_eq!(records.seed_for_level(4), Some(111));
        assert_eq!(records.completed_levels, vec![4]);
        assert_eq!(records.max_level, 4);
    }

    #[test]
    fn test_completed_levels_stay_sorted() {
        let mut records = RunRecords::new();
        for level in [7, 2, 9, 2, 5] {
            records.record_level_completion(level, level * 10);
        }
        assert_eq!(records.completed_levels, vec![2, 5, 7, 9]);
        assert_eq!(records.max_level, 9);
        assert!(records.is_completed(5));
        assert!(!records.is_completed(6));
    }

    #[test]
    fn test_best_time_only_improves() {
        let mut records = RunRecords::new();
        assert!(records.record_race_time("race_5", 42.0));
        assert!(!records.record_race_time("race_5", 50.0));
        assert!(records.record_race_time("race_5", 40.5));
        assert!(!records.record_race_time("race_5", f32::NAN));
        assert_eq!(records.best_time("race_5"), Some(40.5));
    }

    #[test]
    fn test_race_complete_uses_mode_key() {
        let mut records = RunRecords::new();
        records.apply(&GameEvent::RaceComplete {
            mode: GameMode::Speedrun,
            rounds: 50,
            total_time: 321.5,
            reward: 250,
        });
        records.apply(&GameEvent::RaceComplete {
            mode: GameMode::Race { rounds: 10 },
            rounds: 10,
            total_time: 70.0,
            reward: 50,
        });
        assert_eq!(records.best_time("speedrun_50"), Some(321.5));
        assert_eq!(records.best_time("race_10"), Some(70.0));
        assert!(records.completed_levels.is_empty());
    }

    #[test]
    fn test_json_roundtrip_sanitizes() {
        let json = r#"{
            "best_times": { "race_5": 30.0, "race_10": -1.0 },
            "level_seeds": { "0": 5, "3": 77 },
            "completed_levels": [3, 0, 3, 1],
            "max_level": 0
        }"#;
        let records = RunRecords::from_json(json).unwrap();
        assert_eq!(records.completed_levels, vec![1, 3]);
        assert_eq!(records.max_level, 3);
        assert_eq!(records.level_seeds.len(), 1);
        assert_eq!(records.seed_for_level(3), Some(77));
        assert_eq!(records.best_time("race_10"), None);

        let restored = RunRecords::from_json(&records.to_json().unwrap()).unwrap();
        assert_eq!(restored, records);
    }

    #[test]
    fn test_missing_fields_default() {
        let records = RunRecords::from_json("{}").unwrap();
        assert_eq!(records, RunRecords::default());
        assert!(RunRecords::from_json("not json").is_err());
    }
}
