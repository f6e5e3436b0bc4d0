//! Request-scoped types produced while selecting neighbors.

use data_loader::{BookId, Rating, UserId};
use std::collections::HashSet;

/// Everything the pipeline needs to know about the user being served.
///
/// Built once per request from the `RatingIndex` and passed by reference to
/// every later stage.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    pub user_id: UserId,
    /// The user's ratings, ordered by book id
    pub history: Vec<Rating>,
    /// Books the user has rated, for O(1) membership checks
    pub rated_books: HashSet<BookId>,
}

impl TargetProfile {
    /// A profile with no history
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            history: Vec::new(),
            rated_books: HashSet::new(),
        }
    }

    /// True when the user has not rated anything
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Another user who rated at least one of the target's books
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<'a> {
    pub user_id: UserId,
    /// Number of books shared with the target
    pub overlap: usize,
    /// The neighbor's full rating history, ordered by book id
    pub history: &'a [Rating],
}
