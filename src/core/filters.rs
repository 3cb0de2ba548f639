use once_cell::sync::Lazy;
use regex::Regex;
use crate::core::requirements::normalize_job_title;
use crate::models::{ExperienceLevel, JobPosting};

/// Relevance weight for a keyword found in the title
pub const TITLE_WEIGHT: u32 = 2;
/// Relevance weight for a keyword found in any required skill
pub const SKILL_WEIGHT: u32 = 8;
/// Relevance weight per description occurrence
pub const DESCRIPTION_WEIGHT: u32 = 2;
/// Description occurrences counted per keyword
pub const DESCRIPTION_OCCURRENCE_CAP: u32 = 3;
/// Relevance weight for a keyword found in the company name
pub const COMPANY_WEIGHT: u32 = 1;

/// Seniority lexicon, one word-boundary pattern per level
static LEVEL_LEXICON: Lazy<Vec<(ExperienceLevel, Regex)>> = Lazy::new(|| {
    [
        (
            ExperienceLevel::Executive,
            r"(?i)\b(?:chief|ceo|cto|cfo|coo|cio|vice president|vp|executive|c-level)\b",
        ),
        (
            ExperienceLevel::Director,
            r"(?i)\b(?:director|head of|abteilungsleiter)\b",
        ),
        (
            ExperienceLevel::MidSenior,
            r"(?i)\b(?:senior|lead|principal|staff|mid-level|mid level|experienced|[5-9]\+? years|1[0-9]\+? years)\b",
        ),
        (
            ExperienceLevel::Associate,
            r"(?i)\b(?:associate|[2-4]\+? years|1-3 years|2-4 years)\b",
        ),
        (
            ExperienceLevel::Entry,
            r"(?i)\b(?:junior|entry[- ]level|entry|graduate|trainee|intern|internship|apprentice|werkstudent|working student|no experience|0-2 years|1\+? years?)\b",
        ),
    ]
    .into_iter()
    .map(|(level, pattern)| (level, Regex::new(pattern).unwrap()))
    .collect()
});

/// Keyword relevance of a posting for a free-text query.
///
/// Each query term scores independently: title containment, containment in
/// any required skill, capped description occurrences, company containment.
pub fn relevance_score(posting: &JobPosting, keywords: &str) -> u32 {
    let title = posting.title.to_lowercase();
    let description = posting.description.to_lowercase();
    let company = posting.company.to_lowercase();
    let skills: Vec<String> = posting
        .required_skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect();

    keyword_terms(keywords)
        .map(|term| {
            let mut score = 0;
            if title.contains(&term) {
                score += TITLE_WEIGHT;
            }
            if skills.iter().any(|s| s.contains(&term)) {
                score += SKILL_WEIGHT;
            }
            let occurrences = description.matches(&term).count() as u32;
            score += occurrences.min(DESCRIPTION_OCCURRENCE_CAP) * DESCRIPTION_WEIGHT;
            if company.contains(&term) {
                score += COMPANY_WEIGHT;
            }
            score
        })
        .sum()
}

/// Lower-cased whitespace-separated query terms
pub fn keyword_terms(keywords: &str) -> impl Iterator<Item = String> + '_ {
    keywords.split_whitespace().map(|t| t.to_lowercase())
}

/// Seniority stated by a piece of text, most senior level first
pub fn level_in_text(text: &str) -> Option<ExperienceLevel> {
    LEVEL_LEXICON
        .iter()
        .find(|(_, pattern)| pattern.is_match(text))
        .map(|(level, _)| *level)
}

/// Seniority of a posting.
///
/// Title, then the experience requirement, then the description. The first
/// field that names a level decides.
pub fn classify_experience_level(posting: &JobPosting) -> Option<ExperienceLevel> {
    let title = normalize_job_title(&posting.title);
    let level = [
        title.as_str(),
        posting.experience_required.as_str(),
        posting.description.as_str(),
    ]
    .into_iter()
    .find_map(level_in_text);
    level
}

/// Whether a posting fits the requested seniority.
///
/// Postings without any seniority language are assumed to be open to entry
/// candidates and rejected for every other level.
pub fn matches_experience_level(posting: &JobPosting, requested: ExperienceLevel) -> bool {
    match classify_experience_level(posting) {
        Some(level) => level == requested,
        None => requested == ExperienceLevel::Entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_posting(title: &str, company: &str, skills: &[&str], description: &str) -> JobPosting {
        JobPosting {
            id: "job-1".to_string(),
            title: title.to_string(),
            company: company.to_string(),
            location: "Berlin".to_string(),
            description: description.to_string(),
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

    #[test]
    fn test_relevance_weights() {
        let posting = create_posting("Python Engineer", "Snake Co", &["Python"], "python python python python");
        // title 2 + skill 8 + description capped at 3 * 2
        assert_eq!(relevance_score(&posting, "python"), 16);

        let posting = create_posting("Engineer", "Rustaceans GmbH", &[], "");
        assert_eq!(relevance_score(&posting, "rust"), COMPANY_WEIGHT);
    }

    #[test]
    fn test_relevance_zero_for_unrelated_posting() {
        let posting = create_posting("Chef", "Bistro", &["Cooking"], "Kitchen work");
        assert_eq!(relevance_score(&posting, "data scientist"), 0);
    }

    #[test]
    fn test_level_from_title_has_priority() {
        let mut posting = create_posting("Junior Developer", "Acme", &[], "Report to our senior lead");
        posting.experience_required = "5+ years of experience".to_string();

        assert_eq!(classify_experience_level(&posting), Some(ExperienceLevel::Entry));
    }

    #[test]
    fn test_level_falls_back_to_requirement_text() {
        let mut posting = create_posting("Backend Developer", "Acme", &[], "");
        posting.experience_required = "At least 5 years of experience with Go".to_string();

        assert_eq!(classify_experience_level(&posting), Some(ExperienceLevel::MidSenior));
    }

    #[test]
    fn test_abbreviated_title_is_normalized() {
        let posting = create_posting("Sr. Data Engineer", "Acme", &[], "");
        assert_eq!(classify_experience_level(&posting), Some(ExperienceLevel::MidSenior));
    }

    #[test]
    fn test_default_permissive_for_entry_only() {
        let posting = create_posting("Backend Developer", "Acme", &[], "Build APIs");

        assert!(matches_experience_level(&posting, ExperienceLevel::Entry));
        assert!(!matches_experience_level(&posting, ExperienceLevel::MidSenior));
        assert!(!matches_experience_level(&posting, ExperienceLevel::Director));
    }

    #[test]
    fn test_classifies_every_level() {
        let cases = [
            ("Associate Product Manager", ExperienceLevel::Associate),
            ("Director of Engineering", ExperienceLevel::Director),
            ("Head of Data", ExperienceLevel::Director),
            ("Executive Assistant to the Board", ExperienceLevel::Executive),
            ("VP Sales", ExperienceLevel::Executive),
        ];

        for (title, expected) in cases {
            let posting = create_posting(title, "Acme", &[], "");
            assert_eq!(classify_experience_level(&posting), Some(expected), "{}", title);
            assert!(matches_experience_level(&posting, expected));
            assert!(!matches_experience_level(&posting, ExperienceLevel::Entry));
        }
    }

    #[test]
    fn test_intern_does_not_match_internal() {
        assert_eq!(level_in_text("internal tooling team"), None);
        assert_eq!(level_in_text("Summer intern"), Some(ExperienceLevel::Entry));
    }
}
