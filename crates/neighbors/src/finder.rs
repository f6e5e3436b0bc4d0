//! Neighbor Finder - candidate neighbors by rating overlap
//!
//! ## Algorithm
//! 1. Take the set of books the target user rated
//! 2. For each of those books, find every other user who rated it
//! 3. Count, per user, how many of the target's books they share
//! 4. Rank by shared count (descending), ties by user id (ascending)
//! 5. Keep the first `max_neighbors` (default 100)
//!
//! The target user is removed while counting, so a tie for the largest
//! overlap can never push a real neighbor out of the list.

use crate::types::{Neighbor, TargetProfile};
use data_loader::{RatingIndex, UserId};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default cap on the number of neighbors handed to similarity scoring
pub const DEFAULT_MAX_NEIGHBORS: usize = 100;

/// Enumerates and ranks users who share books with the target
#[derive(Clone)]
pub struct NeighborFinder {
    /// Shared reference to the rating index (read-only, so no Mutex needed)
    index: Arc<RatingIndex>,

    /// Maximum number of neighbors returned
    max_neighbors: usize,
}

impl NeighborFinder {
    /// Create a new finder over a shared rating index
    pub fn new(index: Arc<RatingIndex>) -> Self {
        Self {
            index,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
        }
    }

    /// Configure the neighbor cap (default: 100)
    pub fn with_max_neighbors(mut self, max: usize) -> Self {
        self.max_neighbors = max;
        self
    }

    pub fn max_neighbors(&self) -> usize {
        self.max_neighbors
    }

    /// Find the neighbors of the target user, best overlap first
    ///
    /// Returns an empty list when the target has no history or nobody else
    /// rated any of their books.
    #[instrument(skip(self, target), fields(user_id = target.user_id))]
    pub fn find(&self, target: &TargetProfile) -> Vec<Neighbor<'_>> {
        if target.is_empty() || self.max_neighbors == 0 {
            return Vec::new();
        }

        let overlaps = self.count_overlaps(target);
        debug!("Found {} users sharing books with the target", overlaps.len());

        let mut ranked: Vec<(UserId, usize)> = overlaps.into_iter().collect();
        // User ids are unique, so the order is total and deterministic
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_neighbors);

        let neighbors: Vec<Neighbor<'_>> = ranked
            .into_iter()
            .map(|(user_id, overlap)| Neighbor {
                user_id,
                overlap,
                history: self.index.history_of(user_id),
            })
            .collect();

        debug!("Selected {} neighbors", neighbors.len());
        neighbors
    }

    /// Count shared books per user, excluding the target
    fn count_overlaps(&self, target: &TargetProfile) -> HashMap<UserId, usize> {
        target
            .history
            .par_iter()
            .fold(
                HashMap::new,
                |mut local_counts: HashMap<UserId, usize>, rating| {
                    for &user_id in self.index.raters_of(rating.book_id) {
                        if user_id != target.user_id {
                            *local_counts.entry(user_id).or_insert(0) += 1;
                        }
                    }
                    local_counts
                },
            )
            .reduce(HashMap::new, |mut acc, local_counts| {
                for (user_id, count) in local_counts {
                    *acc.entry(user_id).or_insert(0) += count;
                }
                acc
            })
    }
}
