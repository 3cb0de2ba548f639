use crate::core::{ranker::rank, Matcher};
use crate::models::{CandidateProfile, MatchResult, SearchQuery};
use crate::services::job_board::JobSource;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Job search did not finish before the deadline")]
    DeadlineExceeded,
}

/// Ranked results of one pipeline run
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub results: Vec<MatchResult>,
    /// Postings scored before the minimum-score filter
    pub total_postings: usize,
}

/// Search, score and rank under one deadline
#[derive(Clone)]
pub struct MatchPipeline {
    source: Arc<JobSource>,
    matcher: Matcher,
}

impl MatchPipeline {
    pub fn new(source: Arc<JobSource>, matcher: Matcher) -> Self {
        Self { source, matcher }
    }

    pub async fn run(
        &self,
        profile: &CandidateProfile,
        query: &SearchQuery,
        min_score: u8,
    ) -> Result<MatchOutcome, PipelineError> {
        let deadline = Instant::now() + self.matcher.deadline();

        let postings = tokio::time::timeout_at(deadline, self.source.search(query))
            .await
            .map_err(|_| {
                tracing::warn!("Search for '{}' exceeded the deadline", query.keywords);
                PipelineError::DeadlineExceeded
            })?;

        let total_postings = postings.len();
        tracing::info!("Matching {} postings for '{}'", total_postings, query.keywords);

        let results = self.matcher.match_all_until(profile, postings, deadline).await;
        Ok(MatchOutcome {
            results: rank(results, min_score),
            total_postings,
        })
    }
}
