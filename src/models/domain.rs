use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Candidate profile produced by resume parsing
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CandidateProfile {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    #[validate(nested)]
    pub education: Vec<Education>,
}

/// A single position held by the candidate
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Experience {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(rename = "durationYears", default)]
    #[validate(range(min = 0.0, max = 80.0))]
    pub duration_years: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Education {
    #[validate(length(min = 1))]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub institution: String,
}

/// Job posting as produced by the job source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct JobPosting {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "experienceRequired", default = "not_specified")]
    pub experience_required: String,
    #[serde(rename = "educationRequired", default = "not_specified")]
    pub education_required: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub qualifications: Vec<String>,
    #[serde(rename = "applyUrl", default)]
    pub apply_url: String,
    #[serde(default)]
    pub remote: bool,
    #[serde(rename = "jobTypes", default)]
    pub job_types: Vec<String>,
    #[serde(default)]
    pub synthetic: bool,
}

pub(crate) fn not_specified() -> String {
    "Not specified".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Where the final score of a match came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchSource {
    Deterministic,
    Semantic,
}

/// Per-dimension sub-scores, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

/// Scored match between one profile and one posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub score: u8,
    #[serde(rename = "matchedSkills")]
    pub matched_skills: Vec<String>,
    #[serde(rename = "missingSkills")]
    pub missing_skills: Vec<String>,
    pub subscores: SubScores,
    pub explanation: String,
    pub source: MatchSource,
    #[serde(rename = "deterministicScore")]
    pub deterministic_score: u8,
}

/// Requested seniority for a job search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum ExperienceLevel {
    Entry,
    Associate,
    MidSenior,
    Director,
    Executive,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "entry",
            ExperienceLevel::Associate => "associate",
            ExperienceLevel::MidSenior => "mid-senior",
            ExperienceLevel::Director => "director",
            ExperienceLevel::Executive => "executive",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "entry" | "entry-level" | "junior" => Ok(ExperienceLevel::Entry),
            "associate" => Ok(ExperienceLevel::Associate),
            "mid-senior" | "mid senior" | "mid" | "senior" => Ok(ExperienceLevel::MidSenior),
            "director" => Ok(ExperienceLevel::Director),
            "executive" => Ok(ExperienceLevel::Executive),
            other => Err(format!("unknown experience level: {}", other)),
        }
    }
}

impl TryFrom<String> for ExperienceLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Job search parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub language: Option<String>,
    pub limit: Option<usize>,
    pub remote: bool,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_experience_level(mut self, level: ExperienceLevel) -> Self {
        self.experience_level = Some(level);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn remote_only(mut self) -> Self {
        self.remote = true;
        self
    }
}

/// Scoring weights
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills: 0.5,
            experience: 0.3,
            education: 0.2,
        }
    }
}
