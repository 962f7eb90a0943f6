//! High score leaderboard
//!
//! A flat, fixed-length list of numeric scores, sorted descending. The lander
//! keeps 5 entries, the combat variant 10. Persistence is a synchronous JSON
//! file; data loss is cosmetic so load/save failures are logged, not
//! propagated.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Leaderboard length for the lander variant
pub const LANDER_MAX_SCORES: usize = 5;
/// Leaderboard length for the combat variant
pub const COMBAT_MAX_SCORES: usize = 10;

/// Fixed-length high score list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScores {
    scores: Vec<u64>,
    capacity: usize,
}

impl HighScores {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: Vec::new(),
            capacity,
        }
    }

    /// Ordered scores, zero-padded to the full leaderboard length
    pub fn padded(&self) -> Vec<u64> {
        let mut out = self.scores.clone();
        out.resize(self.capacity, 0);
        out
    }

    pub fn top_score(&self) -> Option<u64> {
        self.scores.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Whether `score` would make the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.scores.len() < self.capacity {
            return true;
        }
        self.scores.last().map(|&low| score > low).unwrap_or(true)
    }

    /// Insert a score, keeping the list sorted descending and truncated.
    /// Returns the 1-indexed rank achieved, or None if it didn't qualify.
    /// Duplicate scores are kept once.
    pub fn add_score(&mut self, score: u64) -> Option<usize> {
        if !self.qualifies(score) || self.scores.contains(&score) {
            return None;
        }
        let pos = self
            .scores
            .iter()
            .position(|&s| score > s)
            .unwrap_or(self.scores.len());
        self.scores.insert(pos, score);
        self.scores.truncate(self.capacity);
        if pos < self.capacity { Some(pos + 1) } else { None }
    }

    /// Load a leaderboard from a JSON file, starting fresh when missing or
    /// unreadable
    pub fn load(path: &Path, capacity: usize) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<HighScores>(&json) {
                Ok(mut scores) => {
                    scores.capacity = capacity;
                    scores.scores.sort_unstable_by(|a, b| b.cmp(a));
                    scores.scores.truncate(capacity);
                    log::info!("Loaded {} high scores", scores.scores.len());
                    scores
                }
                Err(err) => {
                    log::warn!("Corrupt high score file {}: {err}", path.display());
                    Self::new(capacity)
                }
            },
            Err(_) => {
                log::info!("No high scores found, starting fresh");
                Self::new(capacity)
            }
        }
    }

    /// Persist to a JSON file; failures are logged and swallowed
    pub fn save(&self, path: &Path) {
        match serde_json::to_string(self) {
            Ok(json) => {
                if let Err(err) = std::fs::write(path, json) {
                    log::warn!("Failed to save high scores: {err}");
                } else {
                    log::info!("High scores saved ({} entries)", self.scores.len());
                }
            }
            Err(err) => log::warn!("Failed to encode high scores: {err}"),
        }
    }
}
