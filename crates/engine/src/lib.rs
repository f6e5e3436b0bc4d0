//! Recommendation engine for the book recommender.
//!
//! This crate wires the stages together (target profile, neighbor
//! selection, similarity scoring, weighted aggregation, catalog join) and
//! exposes the operations the front end calls.

pub mod config;
pub mod engine;

pub use config::EngineConfig;
pub use engine::{RatedBook, Recommendation, RecommendationEngine};
