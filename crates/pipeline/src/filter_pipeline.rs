//! Chains filters into a single post-ranking step.

use crate::traits::Filter;
use crate::types::ScoredBook;
use neighbors::TargetProfile;

/// Applies a sequence of filters in insertion order.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);
/// let kept = pipeline.apply(ranked, &target);
/// ```
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the configured filters, in order
    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Apply all filters in sequence.
    pub fn apply(&self, books: Vec<ScoredBook>, target: &TargetProfile) -> Vec<ScoredBook> {
        let mut current = books;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, target);
            tracing::debug!(
                "Filter {} kept {} of {} books",
                filter.name(),
                current.len(),
                before
            );
        }
        current
    }
}
