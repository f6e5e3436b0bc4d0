//! Filter implementations for the post-ranking pipeline.

pub mod already_rated;

pub use already_rated::AlreadyRatedFilter;
