use crate::config::SemanticSettings;
use crate::core::jitter::apply_jitter;
use crate::models::{CandidateProfile, JobPosting, MatchResult, MatchSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an expert recruiter scoring how well a candidate fits a job. \
Answer with a single JSON object and nothing else.";

/// Errors from the semantic scoring backend
#[derive(Debug, Error)]
pub enum RefineError {
    #[error("Semantic request failed: {0}")]
    Request(reqwest::Error),

    #[error("Semantic API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Semantic request timed out")]
    Timeout,

    #[error("Malformed semantic response: {0}")]
    MalformedResponse(String),

    #[error("Invalid semantic verdict: {0}")]
    Validation(String),
}

impl From<reqwest::Error> for RefineError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RefineError::Timeout
        } else {
            RefineError::Request(e)
        }
    }
}

/// Text-completion backend used for semantic refinement
#[async_trait]
pub trait SemanticScorer: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, RefineError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// OpenAI-compatible chat completions client
pub struct SemanticClient {
    client: Client,
    settings: SemanticSettings,
}

impl SemanticClient {
    pub fn new(settings: SemanticSettings) -> Result<Self, RefineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(RefineError::Request)?;

        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SemanticScorer for SemanticClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, RefineError> {
        let request = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
        };

        tracing::debug!("Sending semantic request to {}", self.endpoint());

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(api_key) = self.settings.api_key.as_deref() {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(RefineError::Api { status, message });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RefineError::MalformedResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RefineError::MalformedResponse("response has no choices".to_string()))
    }
}

/// Schema the model is asked to answer with
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SemanticVerdict {
    pub score: Option<f64>,
    #[serde(default, alias = "matchedSkills")]
    pub matched_skills: Vec<String>,
    #[serde(default, alias = "missingSkills")]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub explanation: String,
}

impl SemanticVerdict {
    /// Validated score in [0, 100]
    pub fn checked_score(&self) -> Result<f64, RefineError> {
        match self.score {
            None => Err(RefineError::Validation("missing score".to_string())),
            Some(s) if !s.is_finite() => Err(RefineError::Validation("score is not finite".to_string())),
            Some(s) if !(0.0..=100.0).contains(&s) => {
                Err(RefineError::Validation(format!("score {} out of range", s)))
            }
            Some(s) => Ok(s),
        }
    }
}

/// Slice of `text` between the first `{` and the last `}`
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model reply into a verdict, ignoring surrounding prose
pub fn parse_verdict(text: &str) -> Result<SemanticVerdict, RefineError> {
    let json = extract_json(text)
        .ok_or_else(|| RefineError::MalformedResponse("no JSON object in reply".to_string()))?;

    serde_json::from_str(json).map_err(|e| RefineError::MalformedResponse(e.to_string()))
}

/// Prompt describing the candidate and the posting
pub fn build_prompt(profile: &CandidateProfile, posting: &JobPosting) -> String {
    let experience = profile
        .experience
        .iter()
        .map(|e| format!("- {} at {} ({} years)", e.title, e.company, e.duration_years))
        .collect::<Vec<_>>()
        .join("\n");
    let education = profile
        .education
        .iter()
        .map(|e| format!("- {} in {} ({})", e.degree, e.field, e.institution))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Evaluate the fit between this candidate and this job.

CANDIDATE
Skills: {skills}
Experience:
{experience}
Education:
{education}

JOB
Title: {title}
Company: {company}
Location: {location}
Required skills: {required}
Experience required: {experience_required}
Education required: {education_required}
Description:
{description}

Score the fit from 0 to 100 using the full range. Never default to 50; if the
fit is uncertain, commit to a score above or below it.

Reply with JSON only:
{{"score": <number>, "matched_skills": [<string>], "missing_skills": [<string>], "explanation": <string>}}"#,
        skills = profile.skills.join(", "),
        experience = if experience.is_empty() { "- none".to_string() } else { experience },
        education = if education.is_empty() { "- none".to_string() } else { education },
        title = posting.title,
        company = posting.company,
        location = posting.location,
        required = posting.required_skills.join(", "),
        experience_required = posting.experience_required,
        education_required = posting.education_required,
        description = truncate_chars(&posting.description, 2000),
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// LLM-backed second opinion for promising matches.
///
/// Fails open: any backend or parsing problem yields the deterministic
/// result unchanged.
#[derive(Clone)]
pub struct SemanticRefiner {
    scorer: Arc<dyn SemanticScorer>,
    promotion_threshold: u8,
}

impl SemanticRefiner {
    pub fn new(scorer: Arc<dyn SemanticScorer>, promotion_threshold: u8) -> Self {
        Self {
            scorer,
            promotion_threshold,
        }
    }

    /// Whether a deterministic result qualifies for refinement
    pub fn is_promoted(&self, deterministic: &MatchResult) -> bool {
        deterministic.score >= self.promotion_threshold
    }

    pub async fn refine(
        &self,
        profile: &CandidateProfile,
        posting: &JobPosting,
        deterministic: &MatchResult,
    ) -> MatchResult {
        match self.try_refine(profile, posting, deterministic).await {
            Ok(refined) => {
                tracing::debug!(
                    "Refined {}: {} -> {}",
                    posting.id,
                    deterministic.score,
                    refined.score
                );
                refined
            }
            Err(e) => {
                tracing::warn!("Semantic refinement failed for {}, keeping deterministic score: {}", posting.id, e);
                deterministic.clone()
            }
        }
    }

    pub async fn try_refine(
        &self,
        profile: &CandidateProfile,
        posting: &JobPosting,
        deterministic: &MatchResult,
    ) -> Result<MatchResult, RefineError> {
        let reply = self
            .scorer
            .complete(SYSTEM_PROMPT, &build_prompt(profile, posting))
            .await?;
        let verdict = parse_verdict(&reply)?;
        let score = verdict.checked_score()?;

        let mut score = score.round() as u8;
        if score == 50 {
            score = apply_jitter(50.0, &posting.title, &posting.company);
        }

        let (matched_skills, missing_skills) =
            anchor_skills(&posting.required_skills, &verdict.matched_skills, &deterministic.matched_skills);

        let explanation = if verdict.explanation.trim().is_empty() {
            deterministic.explanation.clone()
        } else {
            verdict.explanation.trim().to_string()
        };

        Ok(MatchResult {
            job_id: deterministic.job_id.clone(),
            score,
            matched_skills,
            missing_skills,
            subscores: deterministic.subscores,
            explanation,
            source: MatchSource::Semantic,
            deterministic_score: deterministic.score,
        })
    }
}

/// Map skills named by the model back onto the posting's required skills.
///
/// Names that aren't required skills are dropped. When nothing anchors,
/// the deterministic matched set stands.
pub fn anchor_skills(
    required: &[String],
    named: &[String],
    fallback_matched: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut matched: Vec<String> = required
        .iter()
        .filter(|r| named.iter().any(|n| n.trim().eq_ignore_ascii_case(r.trim())))
        .cloned()
        .collect();

    if matched.is_empty() {
        matched = fallback_matched.to_vec();
    }

    let missing = required
        .iter()
        .filter(|r| !matched.iter().any(|m| m.eq_ignore_ascii_case(r)))
        .cloned()
        .collect();

    (matched, missing)
}
