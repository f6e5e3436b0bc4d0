//! Integration tests for the scoring pipeline.
//!
//! These tests run the full chain (target profile, neighbor selection,
//! similarity, aggregation, filters) over small hand-built datasets, and
//! check the output invariants over random ones with proptest.

use std::collections::HashSet;
use std::sync::Arc;

use data_loader::{BookId, Rating, RatingIndex, Score, UserId};
use neighbors::{build_target_profile, NeighborFinder, DEFAULT_MAX_NEIGHBORS};
use pipeline::filters::AlreadyRatedFilter;
use pipeline::{
    FilterPipeline, ScoredBook, SimilarityScore, SimilarityScorer, WeightedAggregator,
    DEFAULT_MIN_SCORE,
};
use proptest::prelude::*;

fn rating(user_id: UserId, book_id: BookId, score: Score) -> Rating {
    Rating {
        user_id,
        book_id,
        score,
    }
}

/// Everything one request produces, stage by stage
struct Run {
    neighbor_ids: Vec<UserId>,
    similarities: Vec<SimilarityScore>,
    ranked: Vec<ScoredBook>,
}

fn run(index: &Arc<RatingIndex>, user_id: UserId) -> Run {
    let target = build_target_profile(index, user_id);
    let finder = NeighborFinder::new(Arc::clone(index));
    let neighbors = finder.find(&target);
    let similarities = SimilarityScorer::new().score(&target, &neighbors);
    let ranked = WeightedAggregator::new(Arc::clone(index)).rank(&similarities);

    Run {
        neighbor_ids: neighbors.iter().map(|n| n.user_id).collect(),
        similarities,
        ranked,
    }
}

#[test]
fn test_constant_only_neighbor_yields_nothing() {
    let index = Arc::new(RatingIndex::from_ratings(vec![
        rating(1, 10, 5.0),
        rating(1, 20, 4.0),
        rating(2, 10, 5.0),
        rating(2, 20, 5.0),
        rating(2, 30, 4.0),
        rating(3, 10, 1.0),
    ]));

    let result = run(&index, 1);

    // Both other users share a book, but user 3 shares only one
    assert_eq!(result.neighbor_ids, vec![2, 3]);
    assert_eq!(result.similarities.len(), 1);
    assert_eq!(result.similarities[0].user_id, 2);

    // [5, 4] against [5, 5]: no variance on the neighbor side
    assert_eq!(result.similarities[0].coefficient, 0.0);
    assert!(result.ranked.is_empty());
}

#[test]
fn test_duplicate_rating_resolves_to_last() {
    let index = RatingIndex::from_ratings(vec![
        rating(7, 1, 2.0),
        rating(7, 2, 3.0),
        rating(7, 1, 5.0),
    ]);

    let history = index.history_of(7);
    assert_eq!(history, &[rating(7, 1, 5.0), rating(7, 2, 3.0)]);
    assert_eq!(index.raters_of(1), &[7]);
}

#[test]
fn test_constant_neighbor_has_zero_weight() {
    let index = Arc::new(RatingIndex::from_ratings(vec![
        rating(1, 1, 5.0),
        rating(1, 2, 3.0),
        rating(1, 3, 1.0),
        // Rates everything 4 except an unshared book
        rating(2, 1, 4.0),
        rating(2, 2, 4.0),
        rating(2, 3, 4.0),
        rating(2, 4, 2.0),
        // Agrees with user 1
        rating(3, 1, 5.0),
        rating(3, 2, 3.0),
        rating(3, 3, 1.0),
        rating(3, 4, 5.0),
    ]));

    let result = run(&index, 1);

    let flat = result.similarities.iter().find(|s| s.user_id == 2).unwrap();
    assert_eq!(flat.coefficient, 0.0);

    // User 2's 2.0 on book 4 carries no weight
    let book_4 = result.ranked.iter().find(|b| b.book_id == 4).unwrap();
    assert!((book_4.score - 5.0).abs() < 1e-5);
    assert_eq!(book_4.contributors, 2);
}

#[test]
fn test_already_rated_books_stay_unless_filtered() {
    let index = Arc::new(RatingIndex::from_ratings(vec![
        rating(1, 1, 5.0),
        rating(1, 2, 3.0),
        rating(1, 3, 1.0),
        rating(2, 1, 5.0),
        rating(2, 2, 3.0),
        rating(2, 3, 1.0),
        rating(2, 4, 4.0),
    ]));

    let result = run(&index, 1);
    let ids: Vec<BookId> = result.ranked.iter().map(|b| b.book_id).collect();
    assert_eq!(ids, vec![1, 4, 2]);

    let target = build_target_profile(&index, 1);
    let filtered = FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .apply(result.ranked, &target);
    let ids: Vec<BookId> = filtered.iter().map(|b| b.book_id).collect();
    assert_eq!(ids, vec![4]);
}

#[test]
fn test_single_other_user_degrades_to_empty() {
    let index = Arc::new(RatingIndex::from_ratings(vec![
        rating(1, 1, 5.0),
        rating(2, 2, 4.0),
    ]));

    let result = run(&index, 1);
    assert!(result.neighbor_ids.is_empty());
    assert!(result.ranked.is_empty());
}

#[test]
fn test_neighbor_cap_on_large_overlap() {
    let mut ratings = vec![rating(1, 1, 5.0), rating(1, 2, 1.0)];
    for user_id in 2..=250 {
        ratings.push(rating(user_id, 1, 4.0));
        ratings.push(rating(user_id, 2, 2.0));
    }
    let index = Arc::new(RatingIndex::from_ratings(ratings));

    let result = run(&index, 1);
    assert_eq!(result.neighbor_ids.len(), DEFAULT_MAX_NEIGHBORS);
    assert_eq!(result.neighbor_ids.first(), Some(&2));
    assert_eq!(result.neighbor_ids.last(), Some(&101));
}

// ============================================================================
// Properties
// ============================================================================

fn ratings_strategy() -> impl Strategy<Value = Vec<Rating>> {
    prop::collection::vec((1u32..25, 1u32..20, 1u8..=5), 0..200).prop_map(|rows| {
        rows.into_iter()
            .map(|(user_id, book_id, score)| rating(user_id, book_id, score as Score))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Ranked output is sorted, unique and above the floor.
    #[test]
    fn prop_ranked_output_invariants(ratings in ratings_strategy(), user_id in 1u32..25) {
        let index = Arc::new(RatingIndex::from_ratings(ratings));
        let result = run(&index, user_id);

        prop_assert!(result.ranked.windows(2).all(|w| w[0].score >= w[1].score));
        prop_assert!(result.ranked.iter().all(|b| b.score >= DEFAULT_MIN_SCORE));

        let unique: HashSet<BookId> = result.ranked.iter().map(|b| b.book_id).collect();
        prop_assert_eq!(unique.len(), result.ranked.len());
    }

    /// Neighbors exclude the target, are capped, and need two co-rated books to be scored.
    #[test]
    fn prop_neighbor_invariants(ratings in ratings_strategy(), user_id in 1u32..25) {
        let index = Arc::new(RatingIndex::from_ratings(ratings));
        let result = run(&index, user_id);

        prop_assert!(!result.neighbor_ids.contains(&user_id));
        prop_assert!(result.neighbor_ids.len() <= DEFAULT_MAX_NEIGHBORS);
        prop_assert!(result.similarities.iter().all(|s| s.co_rated >= 2));
        prop_assert!(result.similarities.iter().all(|s| (-1.0..=1.0).contains(&s.coefficient)));
    }

    /// Users without history get nothing.
    #[test]
    fn prop_empty_history_empty_output(ratings in ratings_strategy()) {
        let index = Arc::new(RatingIndex::from_ratings(ratings));
        let result = run(&index, 999);

        prop_assert!(result.neighbor_ids.is_empty());
        prop_assert!(result.ranked.is_empty());
    }

    /// Two runs over the same data agree exactly.
    #[test]
    fn prop_idempotent(ratings in ratings_strategy(), user_id in 1u32..25) {
        let index = Arc::new(RatingIndex::from_ratings(ratings));
        let first = run(&index, user_id);
        let second = run(&index, user_id);

        prop_assert_eq!(first.neighbor_ids, second.neighbor_ids);
        prop_assert_eq!(first.similarities, second.similarities);
        prop_assert_eq!(first.ranked, second.ranked);
    }
}
