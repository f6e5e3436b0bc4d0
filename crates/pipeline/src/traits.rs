//! Core traits for post-ranking filters.
//!
//! Filters run after aggregation, on the already ranked list, and must keep
//! the relative order of the books they retain.

use crate::types::ScoredBook;
use neighbors::TargetProfile;

/// A step that removes books from a ranked recommendation list.
///
/// `Send + Sync` lets a `FilterPipeline` be shared by concurrent requests.
pub trait Filter: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Return the books to keep, in their original order
    fn apply(&self, books: Vec<ScoredBook>, target: &TargetProfile) -> Vec<ScoredBook>;
}
