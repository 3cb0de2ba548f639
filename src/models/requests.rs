use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{CandidateProfile, ExperienceLevel, JobPosting, SearchQuery};

/// Request to search the job board
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SearchJobsRequest {
    #[validate(length(min = 1, max = 200))]
    pub keywords: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(alias = "experience_level", rename = "experienceLevel", default)]
    pub experience_level: Option<ExperienceLevel>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
    #[serde(default)]
    pub remote: bool,
}

impl From<SearchJobsRequest> for SearchQuery {
    fn from(req: SearchJobsRequest) -> Self {
        SearchQuery {
            keywords: req.keywords,
            location: req.location.filter(|l| !l.trim().is_empty()),
            experience_level: req.experience_level,
            language: req.language,
            limit: req.limit,
            remote: req.remote,
        }
    }
}

/// Request to score a caller-provided set of postings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreJobsRequest {
    #[validate(nested)]
    pub profile: CandidateProfile,
    #[validate(length(min = 1, max = 500))]
    #[validate(nested)]
    pub postings: Vec<JobPosting>,
    #[serde(alias = "min_score", rename = "minScore", default)]
    #[validate(range(max = 100))]
    pub min_score: Option<u8>,
}

/// Request to search and score in one pass
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MatchJobsRequest {
    #[validate(nested)]
    pub profile: CandidateProfile,
    #[validate(nested)]
    pub query: SearchJobsRequest,
    #[serde(alias = "min_score", rename = "minScore", default)]
    #[validate(range(max = 100))]
    pub min_score: Option<u8>,
}

/// Request for a match report and skill-gap plan on one posting
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportJobRequest {
    #[validate(nested)]
    pub profile: CandidateProfile,
    #[validate(nested)]
    pub posting: JobPosting,
}
