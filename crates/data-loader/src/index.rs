//! Index building for the catalog and the rating store.
//!
//! - `RatingIndex::from_ratings`: de-duplicate (last record wins) and build
//!   both lookup directions
//! - `Catalog::from_books`: id and title lookups
//! - `Dataset::load_from_files`: parse, index and validate a data directory

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Lowest and highest score accepted by `Dataset::validate`
pub const MIN_SCORE: Score = 1.0;
pub const MAX_SCORE: Score = 5.0;

impl RatingIndex {
    /// Build the index from raw rating records
    ///
    /// When the same `(user_id, book_id)` pair appears more than once, the
    /// record that comes last in the input is kept, whatever its score.
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        // Later inserts overwrite earlier ones
        let mut latest: HashMap<UserId, HashMap<BookId, Score>> = HashMap::new();
        for rating in ratings {
            latest
                .entry(rating.user_id)
                .or_default()
                .insert(rating.book_id, rating.score);
        }

        let user_ratings: HashMap<UserId, Vec<Rating>> = latest
            .into_par_iter()
            .map(|(user_id, books)| {
                let mut history: Vec<Rating> = books
                    .into_iter()
                    .map(|(book_id, score)| Rating {
                        user_id,
                        book_id,
                        score,
                    })
                    .collect();
                history.sort_unstable_by_key(|r| r.book_id);
                (user_id, history)
            })
            .collect();

        let mut book_raters: HashMap<BookId, Vec<UserId>> = HashMap::new();
        for (&user_id, history) in &user_ratings {
            for rating in history {
                book_raters.entry(rating.book_id).or_default().push(user_id);
            }
        }
        book_raters
            .par_iter_mut()
            .for_each(|(_, raters)| raters.sort_unstable());

        Self {
            user_ratings,
            book_raters,
        }
    }
}

impl Catalog {
    /// Build the catalog from parsed books
    ///
    /// A repeated book id keeps the last record. A repeated title resolves
    /// to the book that was listed first.
    pub fn from_books<I>(books: I) -> Self
    where
        I: IntoIterator<Item = Book>,
    {
        let mut order: Vec<BookId> = Vec::new();
        let mut by_id: HashMap<BookId, Book> = HashMap::new();
        for book in books {
            let id = book.id;
            if by_id.insert(id, book).is_none() {
                order.push(id);
            }
        }

        let mut title_index: HashMap<String, BookId> = HashMap::with_capacity(order.len());
        for id in &order {
            if let Some(book) = by_id.get(id) {
                title_index.entry(book.title.clone()).or_insert(*id);
            }
        }

        Self {
            books: by_id,
            title_index,
        }
    }
}

impl Dataset {
    /// Build a dataset from in-memory records
    pub fn from_records(books: Vec<Book>, ratings: Vec<Rating>) -> Self {
        Self {
            catalog: Catalog::from_books(books),
            ratings: RatingIndex::from_ratings(ratings),
        }
    }

    /// Load books.csv and ratings.csv from a directory
    ///
    /// Steps:
    /// 1. Parse both files in parallel
    /// 2. Build the catalog and the de-duplicated rating index
    /// 3. Validate scores
    ///
    /// An empty books.csv is rejected, since nothing could ever be recommended.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading book dataset from {:?}", data_dir);

        let books_path = data_dir.join("books.csv");
        let ratings_path = data_dir.join("ratings.csv");

        let (books, ratings) = rayon::join(
            || parser::parse_books(&books_path),
            || parser::parse_ratings(&ratings_path),
        );
        let books = books?;
        let ratings = ratings?;

        if books.is_empty() {
            return Err(DataLoadError::ValidationError(format!(
                "no books in {}",
                books_path.display()
            )));
        }

        let raw_ratings = ratings.len();
        info!("Parsed {} books, {} ratings", books.len(), raw_ratings);

        let dataset = Self::from_records(books, ratings);

        let (users, rated_books, kept) = dataset.ratings.counts();
        if kept < raw_ratings {
            debug!("Dropped {} duplicate ratings", raw_ratings - kept);
        }
        info!(
            "Indexed {} users, {} rated books, {} ratings ({} books in catalog)",
            users,
            rated_books,
            kept,
            dataset.catalog.len()
        );

        dataset.validate()?;
        Ok(dataset)
    }

    /// Validate data integrity
    ///
    /// Every score must be finite and within `MIN_SCORE..=MAX_SCORE`.
    /// Ratings for books missing from the catalog are accepted.
    pub fn validate(&self) -> Result<()> {
        if let Some(bad) = self
            .ratings
            .iter()
            .find(|r| !r.score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&r.score))
        {
            return Err(DataLoadError::InvalidValue {
                field: "rating".to_string(),
                value: format!(
                    "{} (user {}, book {})",
                    bad.score, bad.user_id, bad.book_id
                ),
            });
        }
        Ok(())
    }
}
