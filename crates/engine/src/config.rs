//! Tunable parameters of the recommendation engine.

use neighbors::DEFAULT_MAX_NEIGHBORS;
use pipeline::{DEFAULT_MIN_CO_RATED, DEFAULT_MIN_SCORE, DEFAULT_TOP_SIMILAR};
use serde::{Deserialize, Serialize};

/// Engine settings, built with `EngineConfig::default()` and `with_*` calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Neighbors kept after ranking by overlap
    pub max_neighbors: usize,
    /// Co-rated books needed before a similarity is computed
    pub min_co_rated: usize,
    /// Most-similar neighbors whose ratings are aggregated
    pub top_similar: usize,
    /// Minimum predicted score for a book to be recommended
    pub min_score: f32,
    /// Drop books the user already rated (off unless asked for)
    pub exclude_rated: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            min_co_rated: DEFAULT_MIN_CO_RATED,
            top_similar: DEFAULT_TOP_SIMILAR,
            min_score: DEFAULT_MIN_SCORE,
            exclude_rated: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_neighbors(mut self, max: usize) -> Self {
        self.max_neighbors = max;
        self
    }

    pub fn with_min_co_rated(mut self, min: usize) -> Self {
        self.min_co_rated = min;
        self
    }

    pub fn with_top_similar(mut self, top: usize) -> Self {
        self.top_similar = top;
        self
    }

    pub fn with_min_score(mut self, min: f32) -> Self {
        self.min_score = min;
        self
    }

    pub fn with_exclude_rated(mut self, exclude: bool) -> Self {
        self.exclude_rated = exclude;
        self
    }
}
