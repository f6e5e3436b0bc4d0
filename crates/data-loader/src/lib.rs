//! # Data Loader Crate
//!
//! Loads the Goodreads book dataset and builds the immutable in-memory
//! structures the recommender reads from.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Book, Rating, Catalog, RatingIndex, Dataset)
//! - **parser**: Parse the CSV exports and clean book titles
//! - **index**: De-duplicate ratings and build the lookup indices
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::Dataset;
//! use std::path::Path;
//!
//! let dataset = Dataset::load_from_files(Path::new("data/goodbooks"))?;
//!
//! let history = dataset.ratings.history_of(314);
//! let raters = dataset.ratings.raters_of(1);
//! let book = dataset.catalog.get(1).unwrap();
//!
//! println!(
//!     "User 314 rated {} books; {} readers rated {}",
//!     history.len(),
//!     raters.len(),
//!     book.title
//! );
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

pub use error::{DataLoadError, Result};
pub use index::{MAX_SCORE, MIN_SCORE};
pub use parser::clean_title;
pub use types::{
    // Type aliases
    UserId,
    BookId,
    Score,
    // Core types
    Book,
    Rating,
    Catalog,
    RatingIndex,
    Dataset,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = RatingIndex::new();
        let (users, books, ratings) = index.counts();

        assert_eq!(users, 0);
        assert_eq!(books, 0);
        assert_eq!(ratings, 0);
    }

    #[test]
    fn test_empty_queries() {
        let dataset = Dataset::default();

        // Unknown ids are empty results, not errors
        assert!(dataset.ratings.history_of(999).is_empty());
        assert!(dataset.ratings.raters_of(999).is_empty());
        assert!(dataset.ratings.score_of(999, 1).is_none());
        assert!(!dataset.ratings.contains_user(999));
        assert!(dataset.catalog.get(999).is_none());
        assert!(dataset.catalog.find_by_title("Nothing").is_none());
        assert!(dataset.catalog.known_titles().is_empty());
    }

    #[test]
    fn test_known_users() {
        let index = RatingIndex::from_ratings(vec![
            Rating {
                user_id: 5,
                book_id: 1,
                score: 4.0,
            },
            Rating {
                user_id: 9,
                book_id: 1,
                score: 2.0,
            },
        ]);

        let users = index.known_users();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&5));
        assert!(users.contains(&9));
        assert!(index.contains_user(9));
    }
}
