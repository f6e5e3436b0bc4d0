//! Taste similarity between the target user and each neighbor.
//!
//! Similarity is the Pearson correlation of the two users' scores on the
//! books they both rated. Neighbors with fewer than `min_co_rated` shared
//! books are skipped; a correlation that is undefined because one side
//! gave every shared book the same score counts as 0.0.

use crate::types::SimilarityScore;
use data_loader::{Rating, Score};
use neighbors::{Neighbor, TargetProfile};
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

/// Default minimum number of co-rated books for a similarity to be computed
pub const DEFAULT_MIN_CO_RATED: usize = 2;

/// Computes Pearson similarities for candidate neighbors
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    min_co_rated: usize,
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self {
            min_co_rated: DEFAULT_MIN_CO_RATED,
        }
    }

    /// Configure the co-rated threshold (default: 2)
    ///
    /// Values below 2 still never produce a non-zero coefficient from a
    /// single shared book, since one point has no variance.
    pub fn with_min_co_rated(mut self, min: usize) -> Self {
        self.min_co_rated = min;
        self
    }

    pub fn min_co_rated(&self) -> usize {
        self.min_co_rated
    }

    /// Score every neighbor that passes the co-rated threshold
    ///
    /// The result keeps the order of `neighbors`.
    #[instrument(skip(self, target, neighbors), fields(user_id = target.user_id))]
    pub fn score(
        &self,
        target: &TargetProfile,
        neighbors: &[Neighbor<'_>],
    ) -> Vec<SimilarityScore> {
        let scores: Vec<SimilarityScore> = neighbors
            .par_iter()
            .filter_map(|neighbor| self.score_one(&target.history, neighbor))
            .collect();

        debug!(
            "Scored {} of {} neighbors (min co-rated: {})",
            scores.len(),
            neighbors.len(),
            self.min_co_rated
        );
        scores
    }

    /// Similarity with one neighbor, or `None` when they share too few books
    pub fn score_one(
        &self,
        target_history: &[Rating],
        neighbor: &Neighbor<'_>,
    ) -> Option<SimilarityScore> {
        let (target_scores, neighbor_scores) = co_rated_scores(target_history, neighbor.history);
        if target_scores.len() < self.min_co_rated {
            trace!(
                neighbor = neighbor.user_id,
                co_rated = target_scores.len(),
                "Skipping neighbor with too few co-rated books"
            );
            return None;
        }

        let coefficient = pearson_correlation(&target_scores, &neighbor_scores).unwrap_or(0.0);

        Some(SimilarityScore {
            user_id: neighbor.user_id,
            coefficient,
            co_rated: target_scores.len(),
        })
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Align two histories on book id
///
/// Both slices must be sorted by book id (as `RatingIndex` returns them).
/// Returns the target's and the neighbor's scores for the shared books,
/// position by position.
pub fn co_rated_scores(target: &[Rating], neighbor: &[Rating]) -> (Vec<Score>, Vec<Score>) {
    let mut target_scores = Vec::new();
    let mut neighbor_scores = Vec::new();

    let (mut i, mut j) = (0, 0);
    while i < target.len() && j < neighbor.len() {
        match target[i].book_id.cmp(&neighbor[j].book_id) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                target_scores.push(target[i].score);
                neighbor_scores.push(neighbor[j].score);
                i += 1;
                j += 1;
            }
        }
    }

    (target_scores, neighbor_scores)
}

/// Pearson correlation coefficient of two equally long samples
///
/// Returns `None` when it is undefined: fewer than two points, mismatched
/// lengths, or zero variance on either side.
pub fn pearson_correlation(xs: &[Score], ys: &[Score]) -> Option<f32> {
    let n = xs.len();
    if n < 2 || n != ys.len() {
        return None;
    }

    let mean_x = xs.iter().map(|&x| x as f64).sum::<f64>() / n as f64;
    let mean_y = ys.iter().map(|&y| y as f64).sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in xs.iter().zip(ys) {
        let dx = x as f64 - mean_x;
        let dy = y as f64 - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{BookId, UserId};

    fn history(user_id: UserId, scores: &[(BookId, Score)]) -> Vec<Rating> {
        scores
            .iter()
            .map(|&(book_id, score)| Rating {
                user_id,
                book_id,
                score,
            })
            .collect()
    }

    fn target_from(history: Vec<Rating>) -> TargetProfile {
        let mut target = TargetProfile::new(history.first().map(|r| r.user_id).unwrap_or(0));
        target.rated_books = history.iter().map(|r| r.book_id).collect();
        target.history = history;
        target
    }

    #[test]
    fn test_pearson_known_values() {
        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((r - 1.0).abs() < 1e-6);

        let r = pearson_correlation(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-6);

        let r = pearson_correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 4.0, 3.0]).unwrap();
        assert!((r - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_pearson_undefined() {
        assert_eq!(pearson_correlation(&[5.0], &[4.0]), None);
        assert_eq!(pearson_correlation(&[5.0, 4.0], &[5.0, 5.0]), None);
        assert_eq!(pearson_correlation(&[3.0, 3.0, 3.0], &[1.0, 2.0, 5.0]), None);
        assert_eq!(pearson_correlation(&[1.0, 2.0], &[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_co_rated_scores_aligns_by_book() {
        let target = history(1, &[(1, 5.0), (3, 4.0), (5, 2.0), (7, 1.0)]);
        let neighbor = history(2, &[(2, 1.0), (3, 3.0), (4, 2.0), (7, 5.0), (9, 4.0)]);

        let (t, n) = co_rated_scores(&target, &neighbor);
        assert_eq!(t, vec![4.0, 1.0]);
        assert_eq!(n, vec![3.0, 5.0]);
    }

    #[test]
    fn test_neighbor_with_one_shared_book_is_skipped() {
        let target = target_from(history(1, &[(10, 5.0), (20, 4.0)]));
        let other = history(3, &[(10, 1.0)]);
        let neighbor = Neighbor {
            user_id: 3,
            overlap: 1,
            history: &other,
        };

        let scores = SimilarityScorer::new().score(&target, &[neighbor]);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_constant_neighbor_scores_zero() {
        let target = target_from(history(1, &[(1, 5.0), (2, 3.0), (3, 1.0)]));
        let flat = history(2, &[(1, 4.0), (2, 4.0), (3, 4.0)]);
        let neighbor = Neighbor {
            user_id: 2,
            overlap: 3,
            history: &flat,
        };

        let scores = SimilarityScorer::new().score(&target, &[neighbor]);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].coefficient, 0.0);
        assert_eq!(scores[0].co_rated, 3);
    }

    #[test]
    fn test_scores_keep_neighbor_order() {
        let target = target_from(history(1, &[(1, 5.0), (2, 3.0), (3, 1.0)]));
        let agree = history(2, &[(1, 5.0), (2, 3.0), (3, 1.0)]);
        let sparse = history(3, &[(2, 2.0)]);
        let disagree = history(4, &[(1, 1.0), (2, 3.0), (3, 5.0)]);
        let neighbors = [
            Neighbor {
                user_id: 4,
                overlap: 3,
                history: &disagree,
            },
            Neighbor {
                user_id: 3,
                overlap: 1,
                history: &sparse,
            },
            Neighbor {
                user_id: 2,
                overlap: 3,
                history: &agree,
            },
        ];

        let scores = SimilarityScorer::new().score(&target, &neighbors);
        let ids: Vec<UserId> = scores.iter().map(|s| s.user_id).collect();
        assert_eq!(ids, vec![4, 2]);
        assert!((scores[0].coefficient + 1.0).abs() < 1e-6);
        assert!((scores[1].coefficient - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_threshold() {
        let target = target_from(history(1, &[(1, 5.0), (2, 3.0), (3, 1.0)]));
        let two = history(2, &[(1, 5.0), (2, 3.0)]);
        let neighbor = Neighbor {
            user_id: 2,
            overlap: 2,
            history: &two,
        };

        let scorer = SimilarityScorer::new().with_min_co_rated(3);
        assert!(scorer.score(&target, &[neighbor]).is_empty());
    }
}
