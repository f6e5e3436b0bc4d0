//! Filter to remove books the target user has already rated.
//!
//! Not part of the default engine: previously rated books are recommended
//! again unless this filter is switched on explicitly.

use crate::traits::Filter;
use crate::types::ScoredBook;
use neighbors::TargetProfile;

/// Removes books present in `TargetProfile::rated_books`.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(&self, books: Vec<ScoredBook>, target: &TargetProfile) -> Vec<ScoredBook> {
        books
            .into_iter()
            .filter(|book| !target.rated_books.contains(&book.book_id))
            .collect()
    }
}
