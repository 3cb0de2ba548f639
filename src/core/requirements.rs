//! Requirement extraction from free-text job descriptions.
//!
//! Job boards ship descriptions as HTML. These helpers flatten the markup
//! and pull out the sentences that state experience and education
//! requirements, plus the bulleted qualification list when one exists.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};
use crate::models::domain::not_specified;

const MAX_QUALIFICATIONS: usize = 5;

/// Elements whose content ends a line
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
];

/// Elements whose content is never description text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

const EXPERIENCE_PHRASES: &[&str] = &[
    "years of experience",
    "years experience",
    "year experience",
    "years of professional experience",
    "experienced in",
    "experience with",
    "berufserfahrung",
];

const EDUCATION_KEYWORDS: &[&str] = &[
    "degree",
    "bachelor",
    "master",
    "phd",
    "diploma",
    "certification",
];

static SENTENCE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?](?:\s+|$)|\n").unwrap());

static TITLE_ABBREVIATIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("sr", "senior"),
        ("jr", "junior"),
        ("dev", "developer"),
        ("eng", "engineer"),
        ("mgr", "manager"),
        ("mgmt", "management"),
        ("coord", "coordinator"),
        ("admin", "administrator"),
    ]
    .into_iter()
    .map(|(abbr, full)| (Regex::new(&format!(r"\b{}\b\.?", abbr)).unwrap(), full))
    .collect()
});

/// Flatten an HTML description into plain text, one block per line
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut text);

    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty() && line != "-")
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };

        let name = child.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            continue;
        }
        match name {
            "br" => out.push('\n'),
            "li" => out.push_str("\n- "),
            _ => {}
        }
        collect_text(child, out);
        if BLOCK_ELEMENTS.contains(&name) {
            out.push('\n');
        }
    }
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn first_sentence_containing(description: &str, needles: &[&str]) -> Option<String> {
    let lowered = description.to_lowercase();
    needles
        .iter()
        .find(|needle| lowered.contains(*needle))
        .and_then(|needle| {
            sentences(description)
                .find(|sentence| sentence.to_lowercase().contains(needle))
                .map(|s| s.trim_start_matches(['-', '•', '*', ' ']).to_string())
        })
}

/// Sentence stating the experience requirement, or "Not specified"
pub fn extract_experience(description: &str) -> String {
    first_sentence_containing(description, EXPERIENCE_PHRASES).unwrap_or_else(not_specified)
}

/// Sentence stating the education requirement, or "Not specified"
pub fn extract_education(description: &str) -> String {
    first_sentence_containing(description, EDUCATION_KEYWORDS).unwrap_or_else(not_specified)
}

/// Bullet points following a qualifications/requirements heading
pub fn extract_qualifications(description: &str) -> Vec<String> {
    let mut qualifications = Vec::new();
    let mut in_section = false;

    for line in description.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let lowered = line.to_lowercase();
        let is_bullet = line.starts_with(['-', '•', '*']);

        if !is_bullet && (lowered.contains("qualifications") || lowered.contains("requirements")) {
            in_section = true;
            continue;
        }

        if in_section && is_bullet {
            let item = line.trim_start_matches(['-', '•', '*', ' ']).trim();
            if !item.is_empty() {
                qualifications.push(item.to_string());
            }
            if qualifications.len() == MAX_QUALIFICATIONS {
                break;
            }
        }
    }

    qualifications
}

/// Lowercase a job title and expand common abbreviations
pub fn normalize_job_title(title: &str) -> String {
    let mut normalized = title.to_lowercase();
    for (pattern, replacement) in TITLE_ABBREVIATIONS.iter() {
        normalized = pattern.replace_all(&normalized, *replacement).into_owned();
    }
    normalized.trim().to_string()
}
