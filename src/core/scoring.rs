use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use crate::core::jitter::apply_jitter;
use crate::models::{CandidateProfile, JobPosting, ScoringWeights, SubScores};

/// Contribution of each experience word found in the requirement text
const EXPERIENCE_WORD_INCREMENT: f64 = 0.2;
/// Contribution when the candidate reaches the required degree level
const DEGREE_LEVEL_INCREMENT: f64 = 0.6;
/// Contribution of each field-of-study word found in the requirement text
const FIELD_WORD_INCREMENT: f64 = 0.2;
const FIELD_SCORE_CAP: f64 = 0.4;
/// Shortest string allowed to match as a substring of another skill
const MIN_SKILL_OVERLAP_LEN: usize = 3;
/// Significant words are longer than this
const MIN_WORD_LEN: usize = 3;

/// Degree levels, lowest first
const DEGREE_LEVELS: &[&[&str]] = &[
    &["certificate", "certification", "diploma"],
    &["bachelor", "bsc", "b.sc", "undergraduate"],
    &["master", "msc", "m.sc", "mba", "graduate degree"],
    &["phd", "ph.d", "doctorate", "doctoral"],
];

/// One whole-word pattern per degree level, plurals and possessives included
static DEGREE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEGREE_LEVELS
        .iter()
        .map(|keywords| {
            let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
            Regex::new(&format!(r"(?i)\b(?:{})(?:'?s)?\b", alternatives.join("|"))).unwrap()
        })
        .collect()
});

/// Output of the deterministic scoring engine
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    /// Weighted composite before jitter, in [0, 100]
    pub raw: f64,
    /// Final bounded, non-degenerate score
    pub score: u8,
}

impl ScoreBreakdown {
    pub fn subscores(&self) -> SubScores {
        SubScores {
            skills: self.skills,
            experience: self.experience,
            education: self.education,
        }
    }
}

/// Deterministic profile × posting scorer. Pure: no I/O, no clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a posting for a candidate
    ///
    /// score = jitter(100 * (skills * 0.5 + experience * 0.3 + education * 0.2))
    pub fn score(&self, profile: &CandidateProfile, posting: &JobPosting) -> ScoreBreakdown {
        let (skills, matched_skills, missing_skills) =
            calculate_skills_score(&profile.skills, &posting.required_skills);
        let experience = calculate_experience_score(profile, &posting.experience_required);
        let education = calculate_education_score(profile, &posting.education_required);

        let raw = self.composite(skills, experience, education);
        let score = apply_jitter(raw, &posting.title, &posting.company);

        ScoreBreakdown {
            skills,
            experience,
            education,
            matched_skills,
            missing_skills,
            raw,
            score,
        }
    }

    /// Weighted composite in [0, 100]
    pub fn composite(&self, skills: f64, experience: f64, education: f64) -> f64 {
        let total = (skills * self.weights.skills
            + experience * self.weights.experience
            + education * self.weights.education)
            * 100.0;

        total.clamp(0.0, 100.0)
    }
}

/// Skills sub-score with matched and missing sets.
///
/// With no stated requirements the score leans on profile breadth so that
/// postings without skill data don't all tie.
pub fn calculate_skills_score(
    candidate_skills: &[String],
    required_skills: &[String],
) -> (f64, Vec<String>, Vec<String>) {
    if required_skills.is_empty() {
        let breadth = unique_lowercase(candidate_skills).len() as f64 / 20.0;
        return (breadth.clamp(0.3, 0.7), vec![], vec![]);
    }

    let candidate: Vec<String> = unique_lowercase(candidate_skills).into_iter().collect();
    let (matched, missing): (Vec<String>, Vec<String>) = required_skills
        .iter()
        .cloned()
        .partition(|required| skill_matches(&required.to_lowercase(), &candidate));

    let score = matched.len() as f64 / required_skills.len() as f64;
    (score, matched, missing)
}

fn skill_matches(required: &str, candidate_skills: &[String]) -> bool {
    candidate_skills.iter().any(|candidate| {
        candidate == required
            || overlaps(candidate, required)
            || overlaps(required, candidate)
    })
}

/// `haystack` contains `needle` and `needle` is long enough to be meaningful
#[inline]
fn overlaps(haystack: &str, needle: &str) -> bool {
    needle.chars().count() >= MIN_SKILL_OVERLAP_LEN && haystack.contains(needle)
}

/// Experience sub-score: overlap of candidate title/company words with the
/// requirement text
pub fn calculate_experience_score(profile: &CandidateProfile, requirement: &str) -> f64 {
    let requirement = requirement.to_lowercase();
    let words: HashSet<String> = profile
        .experience
        .iter()
        .flat_map(|exp| significant_words(&exp.title).chain(significant_words(&exp.company)))
        .collect();

    let hits = words.iter().filter(|w| requirement.contains(w.as_str())).count();
    (hits as f64 * EXPERIENCE_WORD_INCREMENT).min(1.0)
}

/// Education sub-score: degree level reached plus field-of-study overlap
pub fn calculate_education_score(profile: &CandidateProfile, requirement: &str) -> f64 {
    let requirement = requirement.to_lowercase();

    let degree_score = match degree_level(&requirement) {
        Some(required_level) => {
            let reached = profile
                .education
                .iter()
                .filter_map(|edu| degree_level(&edu.degree.to_lowercase()))
                .max()
                .is_some_and(|level| level >= required_level);
            if reached { DEGREE_LEVEL_INCREMENT } else { 0.0 }
        }
        None => 0.0,
    };

    let fields: HashSet<String> = profile
        .education
        .iter()
        .flat_map(|edu| significant_words(&edu.field))
        .collect();
    let field_hits = fields.iter().filter(|w| requirement.contains(w.as_str())).count();
    let field_score = (field_hits as f64 * FIELD_WORD_INCREMENT).min(FIELD_SCORE_CAP);

    (degree_score + field_score).min(1.0)
}

/// Lowest degree level named in the text (index into DEGREE_LEVELS)
fn degree_level(text: &str) -> Option<usize> {
    DEGREE_PATTERNS.iter().position(|pattern| pattern.is_match(text))
}

fn significant_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .map(|w| w.to_lowercase())
}

fn unique_lowercase(skills: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}
