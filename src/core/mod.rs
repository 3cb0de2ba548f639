// Core algorithm exports
pub mod filters;
pub mod jitter;
pub mod matcher;
pub mod ranker;
pub mod requirements;
pub mod scoring;
pub mod skills;

pub use filters::{classify_experience_level, matches_experience_level, relevance_score};
pub use jitter::apply_jitter;
pub use matcher::Matcher;
pub use ranker::rank;
pub use scoring::{ScoreBreakdown, ScoringEngine};
