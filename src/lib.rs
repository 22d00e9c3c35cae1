// src/lib.rs
//! Hybrid recommendation engine.
//!
//! Combines three independent signals into one ranked, deduplicated list:
//! peer similarity (collaborative), tag overlap with the user's interest
//! profile (content-based) and recency/popularity (trending). All data access
//! goes through the traits in [`store`].

pub mod config;
pub mod engine;
pub mod fusion;
pub mod history;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod profile;
pub mod scoring;
pub mod similarity;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::engine::RecommendationEngine;
pub use crate::history::RecommendationHistory;
pub use crate::model::{
    CandidateKind, ContentItem, InterestProfile, RecommendationBatch, RecommendationRow,
    ScoredCandidate, SimilarUser, UserSummary,
};
pub use crate::store::memory::InMemoryCatalog;
pub use crate::store::{ContentStore, Exclusion, ProfileStore, RecommendationStore};
