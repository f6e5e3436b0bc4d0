//! Scoring stages of the recommender.
//!
//! This crate provides:
//! - `SimilarityScorer`: Pearson similarity between the target and each neighbor
//! - `WeightedAggregator`: similarity-weighted average score per book, with
//!   the minimum-score floor and ranking
//! - `Filter` trait, `FilterPipeline` and filters applied to the ranked list
//!
//! ## Architecture
//! Candidates flow through the stages in one direction:
//! 1. Neighbors (from the `neighbors` crate) are scored for similarity
//! 2. The most similar neighbors' ratings are aggregated into predictions
//! 3. Optional filters trim the ranked list
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{SimilarityScorer, WeightedAggregator};
//!
//! let similarities = SimilarityScorer::new().score(&target, &neighbors);
//! let ranked = WeightedAggregator::new(index.clone()).rank(&similarities);
//! ```

pub mod types;
pub mod similarity;
pub mod aggregator;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;

// Re-export main types
pub use aggregator::{WeightedAggregator, DEFAULT_MIN_SCORE, DEFAULT_TOP_SIMILAR};
pub use filter_pipeline::FilterPipeline;
pub use similarity::{pearson_correlation, SimilarityScorer, DEFAULT_MIN_CO_RATED};
pub use traits::Filter;
pub use types::{ScoredBook, SimilarityScore};
