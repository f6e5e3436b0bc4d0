//! Values passed between the scoring stages.

use data_loader::{BookId, UserId};

/// Taste similarity between the target and one neighbor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub user_id: UserId,
    /// Pearson coefficient in [-1, 1]; 0.0 when undefined
    pub coefficient: f32,
    /// Number of books both users rated
    pub co_rated: usize,
}

/// A book with its predicted score for the target user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredBook {
    pub book_id: BookId,
    /// Similarity-weighted average of the neighbors' scores
    pub score: f32,
    /// Sum of the similarities of the neighbors who rated the book
    pub similarity_sum: f32,
    /// How many retained neighbors rated the book
    pub contributors: usize,
}
