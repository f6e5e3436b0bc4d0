//! Weighted aggregation of neighbor ratings into per-book predictions.
//!
//! ## Algorithm
//! 1. Keep the `top_similar` neighbors with the highest coefficient (default 50)
//! 2. For each rating in their full histories, weight the score by the
//!    neighbor's similarity
//! 3. Per book: S = sum of similarities, W = sum of weighted scores
//! 4. Predicted score = W / S; books with S == 0 have no prediction
//! 5. Drop predictions below `min_score` (default 3.0) and rank descending
//!
//! Sums are accumulated sequentially in a fixed order so that two calls on
//! the same input produce bit-identical scores.

use crate::types::{ScoredBook, SimilarityScore};
use data_loader::{BookId, RatingIndex};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of most-similar neighbors that contribute ratings
pub const DEFAULT_TOP_SIMILAR: usize = 50;

/// Default minimum predicted score for a book to be recommended
pub const DEFAULT_MIN_SCORE: f32 = 3.0;

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    similarity_sum: f64,
    weighted_sum: f64,
    contributors: usize,
}

/// Turns neighbor similarities into ranked book predictions
#[derive(Clone)]
pub struct WeightedAggregator {
    /// Source of the neighbors' full histories
    index: Arc<RatingIndex>,
    top_similar: usize,
    min_score: f32,
}

impl WeightedAggregator {
    pub fn new(index: Arc<RatingIndex>) -> Self {
        Self {
            index,
            top_similar: DEFAULT_TOP_SIMILAR,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    /// Configure how many neighbors contribute (default: 50)
    pub fn with_top_similar(mut self, top: usize) -> Self {
        self.top_similar = top;
        self
    }

    /// Configure the minimum predicted score (default: 3.0)
    pub fn with_min_score(mut self, min: f32) -> Self {
        self.min_score = min;
        self
    }

    pub fn top_similar(&self) -> usize {
        self.top_similar
    }

    pub fn min_score(&self) -> f32 {
        self.min_score
    }

    /// Aggregate, apply the score floor and rank
    ///
    /// Ties keep ascending book id order.
    #[instrument(skip(self, similarities), fields(neighbors = similarities.len()))]
    pub fn rank(&self, similarities: &[SimilarityScore]) -> Vec<ScoredBook> {
        let top = self.select_top(similarities);
        let predictions = self.predict(&top);
        let aggregated = predictions.len();

        // Floor on the exact ratio; the f32 score may round up onto it
        let floor = self.min_score as f64;
        let mut books: Vec<ScoredBook> = predictions
            .into_iter()
            .filter(|(ratio, _)| *ratio >= floor)
            .map(|(_, book)| book)
            .collect();
        books.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        debug!(
            "Aggregated {} books from {} neighbors, {} at or above {}",
            aggregated,
            top.len(),
            books.len(),
            self.min_score
        );
        books
    }

    /// The `top_similar` most similar neighbors, best first
    ///
    /// Equal coefficients keep their input order.
    pub fn select_top(&self, similarities: &[SimilarityScore]) -> Vec<SimilarityScore> {
        let mut sorted = similarities.to_vec();
        sorted.sort_by(|a, b| {
            b.coefficient
                .partial_cmp(&a.coefficient)
                .unwrap_or(Ordering::Equal)
        });
        sorted.truncate(self.top_similar);
        sorted
    }

    /// Similarity-weighted average score per book, ordered by book id
    ///
    /// No score floor is applied here. Books whose similarity sum is zero
    /// are left out since their average is undefined.
    pub fn aggregate(&self, neighbors: &[SimilarityScore]) -> Vec<ScoredBook> {
        self.predict(neighbors)
            .into_iter()
            .map(|(_, book)| book)
            .collect()
    }

    /// Per-book predictions paired with the unrounded W / S ratio
    fn predict(&self, neighbors: &[SimilarityScore]) -> Vec<(f64, ScoredBook)> {
        let mut totals: BTreeMap<BookId, Accumulator> = BTreeMap::new();

        for neighbor in neighbors {
            let similarity = neighbor.coefficient as f64;
            for rating in self.index.history_of(neighbor.user_id) {
                let acc = totals.entry(rating.book_id).or_default();
                acc.similarity_sum += similarity;
                acc.weighted_sum += similarity * rating.score as f64;
                acc.contributors += 1;
            }
        }

        totals
            .into_iter()
            .filter(|(_, acc)| acc.similarity_sum != 0.0)
            .map(|(book_id, acc)| {
                let ratio = acc.weighted_sum / acc.similarity_sum;
                let book = ScoredBook {
                    book_id,
                    score: ratio as f32,
                    similarity_sum: acc.similarity_sum as f32,
                    contributors: acc.contributors,
                };
                (ratio, book)
            })
            .collect()
    }
}
