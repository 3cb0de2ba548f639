use serde::{Deserialize, Serialize};
use crate::models::domain::{JobPosting, MatchResult};
use crate::services::{CacheStats, MatchReport, SkillGapReport};

/// Response for the search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJobsResponse {
    pub postings: Vec<JobPosting>,
    pub synthetic: bool,
    pub total_results: usize,
}

/// Response for the score and match endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchJobsResponse {
    pub results: Vec<MatchResult>,
    pub total_postings: usize,
    pub semantic_count: usize,
}

/// Response for the report endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJobResponse {
    pub result: MatchResult,
    pub report: MatchReport,
    pub skill_gaps: SkillGapReport,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub cache: CacheStats,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
