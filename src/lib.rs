//! Job Matcher - job retrieval and hybrid match scoring service
//!
//! Fetches postings from a public job board (cached, retried, with a
//! synthetic fallback), scores them against a candidate profile with a
//! deterministic engine, and optionally refines promising matches with an
//! LLM-backed semantic scorer. The same backend writes per-posting match
//! reports and skill-gap plans.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{rank, Matcher, ScoringEngine};
pub use models::{CandidateProfile, JobPosting, MatchResult, MatchSource, ScoringWeights, SearchQuery};
pub use services::{JobCache, JobSource, MatchPipeline, SemanticRefiner};
