//! Core domain types for the book dataset.
//!
//! This module defines the data structures shared by every stage of the
//! recommender:
//! - Type aliases for domain clarity (UserId, BookId, Score)
//! - `Book` and `Rating` records
//! - `Catalog`: book metadata keyed by id and by title
//! - `RatingIndex`: the de-duplicated, bidirectional rating store
//!
//! Both `Catalog` and `RatingIndex` are built once at startup and then only
//! read, so they can be shared across threads behind an `Arc` without locks.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a book (the `id` column of books.csv)
pub type BookId = u32;

/// A rating value, 1.0 to 5.0 in the Goodreads data
pub type Score = f32;

// =============================================================================
// Records
// =============================================================================

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Title with the parenthetical series/subtitle removed
    pub title: String,
    pub authors: String,
}

/// A single rating from a user for a book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub book_id: BookId,
    pub score: Score,
}

// =============================================================================
// Catalog
// =============================================================================

/// Book metadata, looked up by id or by cleaned title.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) books: HashMap<BookId, Book>,
    /// Title -> id of the first book loaded with that title
    pub(crate) title_index: HashMap<String, BookId>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a book by id
    pub fn get(&self, id: BookId) -> Option<&Book> {
        self.books.get(&id)
    }

    /// Find a book by its exact (cleaned) title
    pub fn find_by_title(&self, title: &str) -> Option<&Book> {
        self.title_index.get(title).and_then(|id| self.books.get(id))
    }

    /// Every title in the catalog, used by the front end for existence checks
    pub fn known_titles(&self) -> HashSet<&str> {
        self.title_index.keys().map(String::as_str).collect()
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.title_index.contains_key(title)
    }

    /// Iterate over all books in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.values()
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

// =============================================================================
// RatingIndex
// =============================================================================

/// De-duplicated rating store with lookups in both directions.
///
/// Invariants, established by `RatingIndex::from_ratings`:
/// - at most one rating per `(user_id, book_id)` pair
/// - each user's history is sorted by ascending book id
/// - each book's rater list is sorted by ascending user id
#[derive(Debug, Default)]
pub struct RatingIndex {
    /// All ratings made by each user
    pub(crate) user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All users who rated each book
    pub(crate) book_raters: HashMap<BookId, Vec<UserId>>,
}

impl RatingIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a user's rating history, ordered by book id
    ///
    /// Returns an empty slice for unknown users.
    pub fn history_of(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get the users who rated a book, ordered by user id
    pub fn raters_of(&self, book_id: BookId) -> &[UserId] {
        self.book_raters
            .get(&book_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The score a user gave a book, if any
    pub fn score_of(&self, user_id: UserId, book_id: BookId) -> Option<Score> {
        let history = self.history_of(user_id);
        history
            .binary_search_by_key(&book_id, |r| r.book_id)
            .ok()
            .map(|pos| history[pos].score)
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Every user with at least one rating
    pub fn known_users(&self) -> HashSet<UserId> {
        self.user_ratings.keys().copied().collect()
    }

    /// Iterate over every rating, user by user
    pub fn iter(&self) -> impl Iterator<Item = &Rating> {
        self.user_ratings.values().flatten()
    }

    /// (users, books, ratings) counts for logging and sanity checks
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.user_ratings.len(), self.book_raters.len(), total_ratings)
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Everything loaded from disk at startup
#[derive(Debug, Default)]
pub struct Dataset {
    pub catalog: Catalog,
    pub ratings: RatingIndex,
}
