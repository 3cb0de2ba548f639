//! Canonical skill extraction for job postings.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tag prefixes that carry posting metadata rather than skills
const STRUCTURAL_TAG_PREFIXES: &[&str] = &["location:", "type:", "remote:"];

/// Employment-type tags that are not skills
const EMPLOYMENT_TYPE_TAGS: &[&str] = &[
    "full time",
    "full-time",
    "part time",
    "part-time",
    "remote",
    "internship",
    "contract",
    "permanent",
    "freelance",
    "working student",
];

/// Job types that imply a canonical skill set
const JOB_TYPE_SKILLS: &[(&str, &[&str])] = &[
    (
        "business analyst",
        &["Excel", "SQL", "Data Analysis", "Requirements Gathering", "Business Intelligence"],
    ),
    (
        "data scientist",
        &["Python", "R", "Machine Learning", "Statistics", "SQL", "Data Visualization"],
    ),
    ("developer", &["JavaScript", "Python", "SQL", "Git", "Problem Solving"]),
    (
        "project manager",
        &["Project Management", "Agile", "Scrum", "Stakeholder Management"],
    ),
    (
        "marketing",
        &["Marketing Strategy", "SEO", "Content Marketing", "Social Media"],
    ),
    (
        "hr",
        &["Recruitment", "Employee Relations", "HR Policies", "Talent Management"],
    ),
];

/// Skill terms matched as case-insensitive substrings of the description
const DICTIONARY_SKILLS: &[&str] = &[
    "Python", "SQL", "JavaScript", "TypeScript", "Kotlin",
    "Azure", "Docker", "Kubernetes", "Terraform", "Jenkins", "Ansible",
    "PostgreSQL", "MySQL", "MongoDB", "Redis", "Kafka", "Spark",
    "PowerPoint", "Tableau", "Power BI", "Looker",
    "Machine Learning", "Deep Learning", "TensorFlow", "PyTorch", "Pandas", "Scikit-learn",
    "Data Analysis", "Data Science", "Data Visualization", "Statistics", "Mathematics",
    "Agile", "Scrum", "Kanban", "Project Management", "Leadership",
    "Communication", "Teamwork", "Problem Solving", "Critical Thinking",
];

/// Technology names that are too short or too variant for substring matching
static PATTERN_SKILLS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("React", r"(?i)\breact(?:\.?js)?\b"),
        ("Node.js", r"(?i)\bnode(?:\.?js)\b"),
        ("Vue.js", r"(?i)\bvue(?:\.?js)?\b"),
        ("Angular", r"(?i)\bangular(?:\.?js)?\b"),
        ("Java", r"(?i)\bjava\b"),
        ("Go", r"(?i:\bgolang\b|\bgo\s+(?:lang(?:uage)?|programming)\b)|(?:,\s*|\bin\s+|\bwith\s+)Go\b"),
        ("Scala", r"(?i)\bscala\b"),
        ("Swift", r"\bSwift\b"),
        ("C++", r"(?i)\bc\+\+"),
        ("C#", r"(?i)\bc#"),
        ("R", r"(?:^|[\s,(/])R(?:[\s,;/)]|$)"),
        ("AI", r"\bAI\b"),
        ("Git", r"(?i)\bgit(?:hub|lab)?\b"),
        ("Excel", r"(?i)\bexcel\b"),
        ("AWS", r"(?i)\baws\b"),
        ("GCP", r"(?i)\bgcp\b|\bgoogle cloud\b"),
        ("PHP", r"(?i)\bphp\b"),
        ("Ruby", r"(?i)\bruby\b"),
        ("Rust", r"(?i)\brust\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

static JOB_TYPE_PATTERNS: Lazy<Vec<(Regex, &'static [&'static str])>> = Lazy::new(|| {
    JOB_TYPE_SKILLS
        .iter()
        .map(|(phrase, skills)| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
            (Regex::new(&pattern).unwrap(), *skills)
        })
        .collect()
});

/// Ordered, case-insensitively unique skill collection
#[derive(Debug, Default)]
struct SkillSet {
    seen: HashSet<String>,
    skills: Vec<String>,
}

impl SkillSet {
    fn insert(&mut self, skill: &str) {
        let skill = skill.trim();
        if skill.is_empty() {
            return;
        }
        if self.seen.insert(skill.to_lowercase()) {
            self.skills.push(skill.to_string());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.skills
    }
}

/// Whether a tag encodes posting metadata instead of a skill
pub fn is_structural_tag(tag: &str) -> bool {
    let lowered = tag.trim().to_lowercase();
    STRUCTURAL_TAG_PREFIXES.iter().any(|p| lowered.starts_with(p))
        || EMPLOYMENT_TYPE_TAGS.contains(&lowered.as_str())
}

/// Canonical skills implied by job-type phrases in the given texts
pub fn job_type_skills<'a>(texts: impl IntoIterator<Item = &'a str> + Clone) -> Vec<&'static str> {
    JOB_TYPE_PATTERNS
        .iter()
        .filter(|(pattern, _)| texts.clone().into_iter().any(|t| pattern.is_match(t)))
        .flat_map(|(_, skills)| skills.iter().copied())
        .collect()
}

/// Skills mentioned in a free-text description
pub fn description_skills(description: &str) -> Vec<&'static str> {
    let lowered = description.to_lowercase();

    let dictionary = DICTIONARY_SKILLS
        .iter()
        .copied()
        .filter(|skill| lowered.contains(&skill.to_lowercase()));

    let patterns = PATTERN_SKILLS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(description))
        .map(|(name, _)| *name);

    dictionary.chain(patterns).collect()
}

/// Build the canonical skill set of a posting.
///
/// Order of precedence: non-structural tags, job-type expansions (from tags
/// and title), then description mentions. Casing of the first occurrence
/// wins.
pub fn normalize(tags: &[String], title: &str, description: &str) -> Vec<String> {
    let mut set = SkillSet::default();

    for tag in tags.iter().filter(|t| !is_structural_tag(t)) {
        set.insert(tag);
    }

    let texts = tags
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(title));
    for skill in job_type_skills(texts) {
        set.insert(skill);
    }

    for skill in description_skills(description) {
        set.insert(skill);
    }

    set.into_vec()
}
