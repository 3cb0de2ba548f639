// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateProfile, Education, Experience, ExperienceLevel, JobPosting, MatchResult,
    MatchSource, ScoringWeights, SearchQuery, SubScores,
};
pub use requests::{MatchJobsRequest, ReportJobRequest, ScoreJobsRequest, SearchJobsRequest};
pub use responses::{
    ErrorResponse, HealthResponse, MatchJobsResponse, ReportJobResponse, SearchJobsResponse,
};
