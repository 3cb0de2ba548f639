use crate::core::scoring::{ScoreBreakdown, ScoringEngine};
use crate::models::{CandidateProfile, JobPosting, MatchResult, MatchSource, ScoringWeights};
use crate::services::semantic::SemanticRefiner;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Main matching orchestrator - scores a batch of postings concurrently
///
/// # Pipeline Stages
/// 1. Deterministic scoring of every posting
/// 2. Semantic refinement of promoted postings, bounded by the batch deadline
/// 3. Ordered collection, one result per posting
#[derive(Clone)]
pub struct Matcher {
    engine: ScoringEngine,
    refiner: Option<SemanticRefiner>,
    max_concurrency: usize,
    deadline: Duration,
}

impl Matcher {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            engine: ScoringEngine::new(weights),
            refiner: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            deadline: DEFAULT_DEADLINE,
        }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default())
    }

    pub fn with_refiner(mut self, refiner: SemanticRefiner) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Deterministic result for one posting, no I/O
    pub fn score_deterministic(&self, profile: &CandidateProfile, posting: &JobPosting) -> MatchResult {
        deterministic_result(&self.engine, profile, posting)
    }

    /// Score every posting. Always returns exactly one result per posting,
    /// in input order.
    pub async fn match_all(&self, profile: &CandidateProfile, postings: Vec<JobPosting>) -> Vec<MatchResult> {
        self.match_all_until(profile, postings, Instant::now() + self.deadline)
            .await
    }

    /// Like [`Matcher::match_all`] with an explicit deadline for semantic calls
    pub async fn match_all_until(
        &self,
        profile: &CandidateProfile,
        postings: Vec<JobPosting>,
        deadline: Instant,
    ) -> Vec<MatchResult> {
        let shared_profile = Arc::new(profile.clone());
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));

        tracing::debug!(
            "Scoring {} postings (concurrency {})",
            postings.len(),
            self.max_concurrency
        );

        // dropping the set aborts every task still running
        let mut tasks = JoinSet::new();
        for (index, posting) in postings.iter().cloned().enumerate() {
            let profile = Arc::clone(&shared_profile);
            let semaphore = Arc::clone(&semaphore);
            let engine = self.engine;
            let refiner = self.refiner.clone();

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let deterministic = deterministic_result(&engine, &profile, &posting);

                let refiner = match refiner {
                    Some(refiner) if refiner.is_promoted(&deterministic) => refiner,
                    _ => return (index, deterministic),
                };

                let refined = tokio::time::timeout_at(
                    deadline,
                    refiner.refine(&profile, &posting, &deterministic),
                )
                .await;

                match refined {
                    Ok(result) => (index, result),
                    Err(_) => {
                        tracing::warn!("Deadline reached before refining {}", posting.id);
                        (index, deterministic)
                    }
                }
            });
        }

        let mut slots: Vec<Option<MatchResult>> = vec![None; postings.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => tracing::warn!("Scoring task failed ({}), using deterministic score", e),
            }
        }

        let results: Vec<MatchResult> = slots
            .into_iter()
            .zip(&postings)
            .map(|(slot, posting)| slot.unwrap_or_else(|| self.score_deterministic(profile, posting)))
            .collect();

        let semantic = results.iter().filter(|r| r.source == MatchSource::Semantic).count();
        tracing::info!("Scored {} postings ({} refined semantically)", results.len(), semantic);

        results
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn deterministic_result(engine: &ScoringEngine, profile: &CandidateProfile, posting: &JobPosting) -> MatchResult {
    let breakdown = engine.score(profile, posting);
    let explanation = explain(&breakdown, posting.required_skills.len());

    MatchResult {
        job_id: posting.id.clone(),
        score: breakdown.score,
        subscores: breakdown.subscores(),
        matched_skills: breakdown.matched_skills,
        missing_skills: breakdown.missing_skills,
        explanation,
        source: MatchSource::Deterministic,
        deterministic_score: breakdown.score,
    }
}

/// Human-readable summary of a deterministic score
pub fn explain(breakdown: &ScoreBreakdown, required_count: usize) -> String {
    let mut parts = Vec::new();

    if required_count == 0 {
        parts.push("No required skills listed.".to_string());
    } else {
        let matched = if breakdown.matched_skills.is_empty() {
            String::new()
        } else {
            format!(" ({})", breakdown.matched_skills.join(", "))
        };
        parts.push(format!(
            "Matched {} of {} required skills{}.",
            breakdown.matched_skills.len(),
            required_count,
            matched
        ));
        if !breakdown.missing_skills.is_empty() {
            parts.push(format!("Missing: {}.", breakdown.missing_skills.join(", ")));
        }
    }

    parts.push(format!(
        "Experience fit {:.0}%, education fit {:.0}%.",
        breakdown.experience * 100.0,
        breakdown.education * 100.0
    ));

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::semantic::{RefineError, SemanticScorer};
    use async_trait::async_trait;

    fn create_posting(id: &str, title: &str, skills: &[&str]) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Berlin".to_string(),
            description: String::new(),
            required_skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_required: "Not specified".to_string(),
            education_required: "Not specified".to_string(),
            language: "en".to_string(),
            qualifications: vec![],
            apply_url: String::new(),
            remote: false,
            job_types: vec![],
            synthetic: false,
        }
    }

    fn create_profile() -> CandidateProfile {
        CandidateProfile {
            skills: vec!["Python".to_string(), "SQL".to_string()],
            ..Default::default()
        }
    }

    struct SlowScorer;

    #[async_trait]
    impl SemanticScorer for SlowScorer {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, RefineError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(r#"{"score": 90}"#.to_string())
        }
    }

    #[test]
    fn test_explanation_lists_skills() {
        let matcher = Matcher::with_default_weights();
        let result = matcher.score_deterministic(
            &create_profile(),
            &create_posting("1", "Data Scientist", &["Python", "SQL", "Docker"]),
        );

        assert!(result
            .explanation
            .starts_with("Matched 2 of 3 required skills (Python, SQL). Missing: Docker."));
        assert_eq!(result.source, MatchSource::Deterministic);
        assert_eq!(result.score, result.deterministic_score);
    }

    #[tokio::test]
    async fn test_match_all_one_result_per_posting_in_order() {
        let matcher = Matcher::with_default_weights().with_max_concurrency(2);
        let postings: Vec<JobPosting> = (0..12)
            .map(|i| create_posting(&format!("job-{}", i), &format!("Engineer {}", i), &["Python"]))
            .collect();

        let results = matcher.match_all(&create_profile(), postings).await;

        assert_eq!(results.len(), 12);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.job_id, format!("job-{}", i));
            assert!((15..=95).contains(&result.score));
        }
    }

    #[tokio::test]
    async fn test_match_all_empty_batch() {
        let matcher = Matcher::with_default_weights();
        assert!(matcher.match_all(&create_profile(), vec![]).await.is_empty());
    }

    struct CountingScorer {
        finished: Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait]
    impl SemanticScorer for CountingScorer {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, RefineError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.finished.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(r#"{"score": 90}"#.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_batch_aborts_refinement() {
        let finished = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let scorer = CountingScorer { finished: Arc::clone(&finished) };
        let matcher = Matcher::with_default_weights()
            .with_refiner(SemanticRefiner::new(Arc::new(scorer), 0))
            .with_deadline(Duration::from_secs(60));
        let postings: Vec<JobPosting> = (0..4)
            .map(|i| create_posting(&format!("job-{}", i), "Data Scientist", &["Python"]))
            .collect();

        let profile = create_profile();
        let batch = matcher.match_all(&profile, postings);
        assert!(tokio::time::timeout(Duration::from_secs(1), batch).await.is_err());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(finished.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_falls_back_to_deterministic() {
        let refiner = SemanticRefiner::new(Arc::new(SlowScorer), 0);
        let matcher = Matcher::with_default_weights()
            .with_refiner(refiner)
            .with_deadline(Duration::from_secs(5));

        let results = matcher
            .match_all(&create_profile(), vec![create_posting("1", "Data Scientist", &["Python"])])
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, MatchSource::Deterministic);
    }
}
