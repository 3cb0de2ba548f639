use crate::config::JobBoardSettings;
use crate::core::{filters, jitter::fnv1a_64, requirements, skills};
use crate::models::{JobPosting, SearchQuery};
use crate::services::cache::{CacheKey, JobCache};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the job board
#[derive(Debug, Error)]
pub enum JobBoardError {
    #[error("Job board rate limited the request")]
    RateLimited,

    #[error("Transient fetch error: {0}")]
    Transient(#[from] reqwest::Error),

    #[error("Job board returned error: {status}")]
    Api { status: StatusCode },

    #[error("Malformed job board response: {0}")]
    MalformedResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl JobBoardError {
    /// Whether the retry loop should try again
    pub fn is_retryable(&self) -> bool {
        match self {
            JobBoardError::RateLimited => true,
            JobBoardError::Transient(_) => true,
            JobBoardError::Api { status } => status.is_server_error(),
            JobBoardError::MalformedResponse(_) | JobBoardError::Client(_) => false,
        }
    }
}

/// Job board response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct BoardResponse {
    #[serde(default)]
    pub data: Vec<RawPosting>,
}

/// Posting as returned by the job board
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPosting {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub job_types: Vec<String>,
    #[serde(default)]
    pub location: String,
}

/// Map a language name or code to its two-letter ISO code.
///
/// `None` means "no language filter".
pub fn language_code(language: &str) -> Option<String> {
    let lowered = language.trim().to_lowercase();
    let code = match lowered.as_str() {
        "" | "any" | "all" => return None,
        "english" => "en",
        "german" | "deutsch" => "de",
        "french" | "français" | "francais" => "fr",
        "spanish" | "español" | "espanol" => "es",
        "italian" => "it",
        "dutch" => "nl",
        "portuguese" => "pt",
        code if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) => code,
        other => {
            tracing::debug!("Unknown language '{}', not filtering by language", other);
            return None;
        }
    };
    Some(code.to_string())
}

/// Job source client
///
/// Fetches postings from the job board with:
/// - a TTL cache keyed by the normalized query
/// - bounded retries with linear backoff on 429/5xx/transport failures
/// - deterministic synthetic postings when the board stays unavailable
/// - keyword relevance and experience-level post-filtering
pub struct JobSource {
    client: Client,
    settings: JobBoardSettings,
    cache: Arc<JobCache>,
}

impl JobSource {
    /// Create a new job source over an injected cache
    pub fn new(settings: JobBoardSettings, cache: Arc<JobCache>) -> Result<Self, JobBoardError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| JobBoardError::Client(e.to_string()))?;

        Ok(Self {
            client,
            settings,
            cache,
        })
    }

    pub fn cache(&self) -> &Arc<JobCache> {
        &self.cache
    }

    /// Search postings. Never fails: on persistent board failure the
    /// result is a synthetic posting set derived from the query.
    pub async fn search(&self, query: &SearchQuery) -> Vec<JobPosting> {
        let key = CacheKey::search(query);

        let fetched = self
            .cache
            .get_or_try_fetch(&key, async {
                let raw = self.fetch_with_retry(query).await?;
                let fetched = raw.len();
                let postings = self.filter_and_rank(raw, query);
                tracing::info!(
                    "Fetched {} postings for '{}', {} kept after filtering",
                    fetched,
                    query.keywords,
                    postings.len()
                );
                Ok::<_, JobBoardError>(postings)
            })
            .await;

        match fetched {
            Ok(postings) => postings,
            Err(e) => {
                tracing::warn!(
                    "Job board unavailable for '{}' ({}), serving synthetic postings",
                    query.keywords,
                    e
                );
                synthetic_postings(query)
            }
        }
    }

    /// Look up a posting previously returned by a live cached search
    pub fn job_details(&self, job_id: &str) -> Option<JobPosting> {
        self.cache.find_posting(job_id)
    }

    /// Fetch raw postings, retrying transient failures
    pub async fn fetch_with_retry(&self, query: &SearchQuery) -> Result<Vec<RawPosting>, JobBoardError> {
        let url = self.build_url(query);
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            tracing::debug!("Fetching postings (attempt {}/{}): {}", attempt, max_attempts, url);

            match self.fetch_once(&url).await {
                Ok(postings) => return Ok(postings),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = Duration::from_millis(self.settings.backoff_base_ms * attempt as u64);
                    tracing::warn!(
                        "Job board attempt {} failed ({}), retrying in {}ms",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<RawPosting>, JobBoardError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(JobBoardError::RateLimited);
        }
        if !status.is_success() {
            return Err(JobBoardError::Api { status });
        }

        let body: BoardResponse = response
            .json()
            .await
            .map_err(|e| JobBoardError::MalformedResponse(e.to_string()))?;

        Ok(body.data)
    }

    /// Build the board URL with mapped query parameters
    pub fn build_url(&self, query: &SearchQuery) -> String {
        let page_size = query
            .limit
            .unwrap_or(self.settings.default_limit)
            .clamp(1, self.settings.page_size_max.max(1));

        let mut params: Vec<(&str, String)> = Vec::new();
        if !query.keywords.trim().is_empty() {
            params.push(("search", query.keywords.trim().to_string()));
        }
        if let Some(location) = query.location.as_deref().filter(|l| !l.trim().is_empty()) {
            params.push(("location", location.trim().to_string()));
        }
        if let Some(code) = query.language.as_deref().and_then(language_code) {
            params.push(("language", code));
        }
        if query.remote {
            params.push(("remote", "true".to_string()));
        }
        params.push(("sort", "relevance".to_string()));
        params.push(("page_size", page_size.to_string()));

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.settings.base_url.trim_end_matches('/'), query_string)
    }

    /// Map, filter by relevance and seniority, sort and truncate
    pub fn filter_and_rank(&self, raw: Vec<RawPosting>, query: &SearchQuery) -> Vec<JobPosting> {
        let language = query
            .language
            .as_deref()
            .and_then(language_code)
            .unwrap_or_else(|| "en".to_string());
        let has_keywords = filters::keyword_terms(&query.keywords).next().is_some();

        let mut scored: Vec<(u32, JobPosting)> = raw
            .into_iter()
            .map(|r| map_raw_posting(r, &language))
            .map(|p| (filters::relevance_score(&p, &query.keywords), p))
            .filter(|(relevance, _)| !has_keywords || *relevance > 0)
            .filter(|(_, p)| {
                query
                    .experience_level
                    .map_or(true, |level| filters::matches_experience_level(p, level))
            })
            .collect();

        // stable: equal relevance keeps board order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut postings: Vec<JobPosting> = scored.into_iter().map(|(_, p)| p).collect();
        if let Some(limit) = query.limit {
            postings.truncate(limit);
        }
        postings
    }
}

/// Convert a board posting into the domain posting
pub fn map_raw_posting(raw: RawPosting, language: &str) -> JobPosting {
    let description = requirements::strip_html(&raw.description);
    let required_skills = skills::normalize(&raw.tags, &raw.title, &description);

    JobPosting {
        id: raw.slug,
        title: non_empty_or(raw.title, "Unknown position"),
        company: non_empty_or(raw.company_name, "Unknown company"),
        location: non_empty_or(raw.location, "Unknown location"),
        experience_required: requirements::extract_experience(&description),
        education_required: requirements::extract_education(&description),
        qualifications: requirements::extract_qualifications(&description),
        description,
        required_skills,
        language: language.to_string(),
        apply_url: raw.url,
        remote: raw.remote,
        job_types: raw.job_types,
        synthetic: false,
    }
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

const MOCK_TITLES: &[&str] = &[
    "Data Scientist",
    "Machine Learning Engineer",
    "Data Analyst",
    "AI Researcher",
    "Business Intelligence Analyst",
];
const MOCK_COMPANIES: &[&str] = &["TechCorp", "DataSystems", "AILabs", "Analytics Plus", "Future Tech"];
const MOCK_CITIES: &[&str] = &["Paris", "Lyon", "Marseille", "Bordeaux"];
const MOCK_SKILLS: &[&str] = &[
    "Python",
    "SQL",
    "Machine Learning",
    "Data Analysis",
    "Statistics",
    "Deep Learning",
    "TensorFlow",
    "PyTorch",
    "Pandas",
    "Scikit-learn",
];
const MOCK_SKILLS_PER_POSTING: usize = 5;
const MOCK_DEFAULT_COUNT: usize = 5;
const MOCK_MAX_COUNT: usize = 10;

/// Deterministic stand-in postings for an unavailable job board.
///
/// Derived only from keywords and location, so the same request always
/// yields the same set.
pub fn synthetic_postings(query: &SearchQuery) -> Vec<JobPosting> {
    let keywords = query.keywords.split_whitespace().collect::<Vec<_>>().join(" ");
    let location = query.location.as_deref().map(str::trim).unwrap_or("");
    let seed = fnv1a_64(&format!(
        "{}|{}",
        keywords.to_lowercase(),
        location.to_lowercase()
    ));
    let count = query
        .limit
        .unwrap_or(MOCK_DEFAULT_COUNT)
        .clamp(1, MOCK_MAX_COUNT);
    let language = query
        .language
        .as_deref()
        .and_then(language_code)
        .unwrap_or_else(|| "en".to_string());
    let first_location = if location.is_empty() { "Remote" } else { location };

    (0..count)
        .map(|i| {
            let offset = (seed % MOCK_TITLES.len() as u64) as usize;
            let title = MOCK_TITLES[(i + offset) % MOCK_TITLES.len()];
            let company = MOCK_COMPANIES[(i + offset) % MOCK_COMPANIES.len()];
            let location = if i % (MOCK_CITIES.len() + 1) == 0 {
                first_location
            } else {
                MOCK_CITIES[(i % (MOCK_CITIES.len() + 1)) - 1]
            };

            let mut skills: Vec<&str> = MOCK_SKILLS.to_vec();
            skills.sort_by_key(|s| fnv1a_64(&format!("{:016x}:{}:{}", seed, i, s)));
            skills.truncate(MOCK_SKILLS_PER_POSTING);

            let focus = if keywords.is_empty() { title.to_string() } else { keywords.clone() };

            JobPosting {
                id: format!("mock-{:016x}-{}", seed, i),
                title: title.to_string(),
                company: company.to_string(),
                location: location.to_string(),
                description: format!(
                    "We are looking for a talented {} to join our team working on {}.",
                    title, focus
                ),
                required_skills: skills.into_iter().map(String::from).collect(),
                experience_required: "3+ years in data science".to_string(),
                education_required: "Bachelor's degree in related field".to_string(),
                language: language.clone(),
                qualifications: vec![
                    "Bachelor's degree".to_string(),
                    "3+ years experience".to_string(),
                ],
                apply_url: "https://example.com/apply".to_string(),
                remote: location == "Remote",
                job_types: vec![],
                synthetic: true,
            }
        })
        .collect()
}
