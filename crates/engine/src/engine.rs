//! # Recommendation Engine
//!
//! Coordinates one recommendation request:
//! 1. Build the target profile from the rating index
//! 2. Select up to `max_neighbors` users by rating overlap
//! 3. Score each neighbor with the Pearson correlation on co-rated books
//! 4. Aggregate the `top_similar` neighbors' ratings into predictions
//! 5. Run the configured filters
//! 6. Join the ranked books with the catalog (books missing from it are dropped)
//!
//! The engine only reads the catalog and the index after construction, so a
//! single instance (or cheap clones of it) can serve requests from many
//! threads at once.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use data_loader::{Book, BookId, Catalog, Dataset, RatingIndex, Score, UserId};
use neighbors::{NeighborFinder, build_target_profile};
use pipeline::filters::AlreadyRatedFilter;
use pipeline::{FilterPipeline, ScoredBook, SimilarityScorer, WeightedAggregator};

/// A recommended book, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub book_id: BookId,
    pub title: String,
    pub authors: String,
    /// Predicted score, at least the configured minimum
    pub score: f32,
    /// Number of similar users who rated the book
    pub contributors: usize,
    /// Sum of those users' similarities
    pub similarity_sum: f32,
}

/// A book the user rated, joined with the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedBook {
    pub book_id: BookId,
    pub title: String,
    pub authors: String,
    pub score: Score,
}

/// User-based collaborative filtering over a loaded dataset
#[derive(Clone)]
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    index: Arc<RatingIndex>,
    finder: NeighborFinder,
    scorer: SimilarityScorer,
    aggregator: WeightedAggregator,
    filters: Arc<FilterPipeline>,
    config: EngineConfig,
}

impl RecommendationEngine {
    /// Create an engine with the default configuration
    pub fn new(catalog: Arc<Catalog>, index: Arc<RatingIndex>) -> Self {
        Self::with_config(catalog, index, EngineConfig::default())
    }

    pub fn with_config(
        catalog: Arc<Catalog>,
        index: Arc<RatingIndex>,
        config: EngineConfig,
    ) -> Self {
        let finder =
            NeighborFinder::new(Arc::clone(&index)).with_max_neighbors(config.max_neighbors);
        let scorer = SimilarityScorer::new().with_min_co_rated(config.min_co_rated);
        let aggregator = WeightedAggregator::new(Arc::clone(&index))
            .with_top_similar(config.top_similar)
            .with_min_score(config.min_score);

        let mut filters = FilterPipeline::new();
        if config.exclude_rated {
            filters = filters.add_filter(AlreadyRatedFilter);
        }
        debug!(
            "Engine ready: {} neighbors, {} co-rated, top {}, floor {}, filters {:?}",
            finder.max_neighbors(),
            scorer.min_co_rated(),
            aggregator.top_similar(),
            aggregator.min_score(),
            filters.names()
        );

        Self {
            catalog,
            index,
            finder,
            scorer,
            aggregator,
            filters: Arc::new(filters),
            config,
        }
    }

    /// Take ownership of a loaded dataset
    pub fn from_dataset(dataset: Dataset, config: EngineConfig) -> Self {
        Self::with_config(Arc::new(dataset.catalog), Arc::new(dataset.ratings), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ratings(&self) -> &RatingIndex {
        &self.index
    }

    /// Recommend books for a user, best prediction first
    ///
    /// Never fails: an unknown user, a user without neighbors or a user whose
    /// neighbors are all too dissimilar gets an empty list. Callers that need
    /// to tell an unknown user apart check `is_known_user` first.
    pub fn recommend(&self, user_id: UserId) -> Vec<Recommendation> {
        let start_time = Instant::now();

        let target = build_target_profile(&self.index, user_id);
        if target.is_empty() {
            debug!("User {} has no ratings", user_id);
            return Vec::new();
        }

        let neighbors = self.finder.find(&target);
        let similarities = self.scorer.score(&target, &neighbors);
        let ranked = self.aggregator.rank(&similarities);
        let filtered = self.filters.apply(ranked, &target);
        let recommendations = self.join_catalog(filtered);

        info!(
            "Recommended {} books for user {} ({} neighbors, {} scored) in {:.2?}",
            recommendations.len(),
            user_id,
            neighbors.len(),
            similarities.len(),
            start_time.elapsed()
        );
        recommendations
    }

    /// Attach catalog metadata, keeping the ranking order
    fn join_catalog(&self, ranked: Vec<ScoredBook>) -> Vec<Recommendation> {
        let before = ranked.len();
        let joined: Vec<Recommendation> = ranked
            .into_iter()
            .filter_map(|scored| {
                let book = self.catalog.get(scored.book_id)?;
                Some(Recommendation {
                    book_id: scored.book_id,
                    title: book.title.clone(),
                    authors: book.authors.clone(),
                    score: scored.score,
                    contributors: scored.contributors,
                    similarity_sum: scored.similarity_sum,
                })
            })
            .collect();

        if joined.len() < before {
            debug!("Dropped {} books missing from the catalog", before - joined.len());
        }
        joined
    }

    /// Every user id with at least one rating
    pub fn known_users(&self) -> HashSet<UserId> {
        self.index.known_users()
    }

    /// Every cleaned title in the catalog
    pub fn known_items(&self) -> HashSet<&str> {
        self.catalog.known_titles()
    }

    pub fn is_known_user(&self, user_id: UserId) -> bool {
        self.index.contains_user(user_id)
    }

    pub fn is_known_item(&self, title: &str) -> bool {
        self.catalog.contains_title(title)
    }

    pub fn find_book_by_title(&self, title: &str) -> Option<&Book> {
        self.catalog.find_by_title(title)
    }

    /// A user's ratings joined with the catalog, by ascending book id
    pub fn rated_books(&self, user_id: UserId) -> Vec<RatedBook> {
        self.index
            .history_of(user_id)
            .iter()
            .filter_map(|rating| {
                let book = self.catalog.get(rating.book_id)?;
                Some(RatedBook {
                    book_id: rating.book_id,
                    title: book.title.clone(),
                    authors: book.authors.clone(),
                    score: rating.score,
                })
            })
            .collect()
    }

    /// Case-insensitive title search
    ///
    /// Exact (case-insensitive) matches come first, then the remaining
    /// substring matches; each group is ordered by title, then book id.
    pub fn search_titles(&self, query: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<(bool, String, &Book)> = self
            .catalog
            .iter()
            .filter_map(|book| {
                let title = book.title.to_lowercase();
                title
                    .contains(&needle)
                    .then(|| (title != needle, title, book))
            })
            .collect();

        matches.sort_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        matches.into_iter().map(|(_, _, book)| book).collect()
    }
}
