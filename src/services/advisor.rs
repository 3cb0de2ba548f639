//! Match reports and skill-gap plans for a single candidate/posting pair.
//!
//! Both reports come from the same completion backend as refinement. A
//! failed call or an invalid reply yields a deterministic report built from
//! the scored match, so callers always get an answer.

use crate::models::{CandidateProfile, JobPosting, MatchResult, MatchSource};
use crate::services::semantic::{extract_json, RefineError, SemanticScorer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const REPORT_SYSTEM_PROMPT: &str = "You are an assistant specializing in job matching analysis. \
Answer with a single JSON object and nothing else.";

const GAP_SYSTEM_PROMPT: &str = "You are a career advisor recommending how to build missing skills. \
Answer with a single JSON object and nothing else.";

/// Entries kept per report list
const MAX_REPORT_ITEMS: usize = 3;
/// Skills described by the fallback plan
const MAX_FALLBACK_GAPS: usize = 3;

const NO_GAPS_PLAN: &str = "You already have all the required skills for this position.";
const FALLBACK_PLAN: &str = "Start with the skills the posting lists first, then the rest.";
const FALLBACK_TIME_ESTIMATE: &str = "4-8 weeks depending on prior experience";
const FALLBACK_RESOURCES: &[&str] = &[
    "Online courses on platforms like Coursera or Udemy",
    "Official documentation and tutorials",
];

/// Strengths, weaknesses and a short summary of one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub summary: String,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPriority {
    High,
    Medium,
    Low,
}

/// Learning advice for one missing skill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGap {
    pub skill: String,
    pub priority: GapPriority,
    pub resources: Vec<String>,
    pub time_estimate: String,
}

/// Prioritized missing skills with a learning plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGapReport {
    pub missing_skills: Vec<SkillGap>,
    pub learning_plan: String,
    pub source: MatchSource,
}

#[derive(Debug, Deserialize)]
struct ReportReply {
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    summary: String,
}

#[derive(Debug, Deserialize)]
struct GapReply {
    #[serde(default, alias = "missingSkills")]
    missing_skills: Vec<GapEntry>,
    #[serde(default, alias = "learningPlan")]
    learning_plan: String,
}

#[derive(Debug, Deserialize)]
struct GapEntry {
    #[serde(default)]
    skill: String,
    #[serde(default)]
    priority: String,
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default, alias = "timeEstimate")]
    time_estimate: String,
}

fn parse_reply<T: for<'de> Deserialize<'de>>(text: &str) -> Result<T, RefineError> {
    let json = extract_json(text)
        .ok_or_else(|| RefineError::MalformedResponse("no JSON object in reply".to_string()))?;

    serde_json::from_str(json).map_err(|e| RefineError::MalformedResponse(e.to_string()))
}

fn clean_items(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_REPORT_ITEMS)
        .collect()
}

/// Validate a report reply
pub fn parse_report(text: &str) -> Result<MatchReport, RefineError> {
    let reply: ReportReply = parse_reply(text)?;

    let strengths = clean_items(reply.strengths);
    let weaknesses = clean_items(reply.weaknesses);
    let summary = reply.summary.trim().to_string();

    if summary.is_empty() {
        return Err(RefineError::Validation("report has no summary".to_string()));
    }
    if strengths.is_empty() && weaknesses.is_empty() {
        return Err(RefineError::Validation("report lists no strengths or weaknesses".to_string()));
    }

    Ok(MatchReport {
        strengths,
        weaknesses,
        summary,
        source: MatchSource::Semantic,
    })
}

/// Validate a skill-gap reply against the skills that are actually missing.
///
/// Entries for skills outside `missing` are dropped; an unknown priority
/// rejects the whole reply.
pub fn parse_skill_gaps(text: &str, missing: &[String]) -> Result<SkillGapReport, RefineError> {
    let reply: GapReply = parse_reply(text)?;

    let mut gaps = Vec::new();
    for entry in reply.missing_skills {
        let Some(skill) = missing
            .iter()
            .find(|m| m.trim().eq_ignore_ascii_case(entry.skill.trim()))
        else {
            continue;
        };

        let priority = match entry.priority.trim().to_lowercase().as_str() {
            "high" => GapPriority::High,
            "medium" => GapPriority::Medium,
            "low" => GapPriority::Low,
            other => {
                return Err(RefineError::Validation(format!("unknown priority '{}'", other)));
            }
        };

        gaps.push(SkillGap {
            skill: skill.clone(),
            priority,
            resources: entry
                .resources
                .into_iter()
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect(),
            time_estimate: entry.time_estimate.trim().to_string(),
        });
    }

    if gaps.is_empty() {
        return Err(RefineError::Validation("no missing skill was addressed".to_string()));
    }

    Ok(SkillGapReport {
        missing_skills: gaps,
        learning_plan: reply.learning_plan.trim().to_string(),
        source: MatchSource::Semantic,
    })
}

pub fn build_report_prompt(profile: &CandidateProfile, posting: &JobPosting) -> String {
    let education = profile
        .education
        .iter()
        .map(|e| format!("{} in {}", e.degree, e.field))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Analyze the overall match between a candidate and a job posting.

CANDIDATE
Skills: {skills}
Experience: {positions} positions
Education: {education}

JOB
Title: {title}
Company: {company}
Required skills: {required}
Experience required: {experience_required}
Education required: {education_required}

List three key strengths of the candidate for this position, three areas to
improve to better match it, and a two or three sentence summary.

Reply with JSON only:
{{"strengths": [<string>], "weaknesses": [<string>], "summary": <string>}}"#,
        skills = profile.skills.iter().take(10).cloned().collect::<Vec<_>>().join(", "),
        positions = profile.experience.len(),
        education = if education.is_empty() { "none".to_string() } else { education },
        title = posting.title,
        company = posting.company,
        required = posting.required_skills.join(", "),
        experience_required = posting.experience_required,
        education_required = posting.education_required,
    )
}

pub fn build_gap_prompt(candidate_skills: &[String], missing: &[String]) -> String {
    format!(
        r#"A job candidate is missing these skills required for a position:
{missing}

The candidate already has these skills:
{skills}

For each missing skill give its priority for the role (high, medium or low),
specific resources to learn it and the time needed for basic proficiency.
Include every missing skill.

Reply with JSON only:
{{"missing_skills": [{{"skill": <string>, "priority": "high|medium|low", "resources": [<string>], "time_estimate": <string>}}], "learning_plan": <string>}}"#,
        missing = missing.join(", "),
        skills = candidate_skills.join(", "),
    )
}

/// Report derived from the scored match alone
pub fn fallback_report(result: &MatchResult) -> MatchReport {
    let mut strengths: Vec<String> = result
        .matched_skills
        .iter()
        .take(MAX_REPORT_ITEMS)
        .map(|s| format!("Has the required skill {}", s))
        .collect();
    if strengths.is_empty() {
        strengths.push("Brings a transferable skill set".to_string());
    }

    let mut weaknesses: Vec<String> = result
        .missing_skills
        .iter()
        .take(MAX_REPORT_ITEMS)
        .map(|s| format!("Could build experience with {}", s))
        .collect();
    if weaknesses.is_empty() {
        weaknesses.push("No required skill is missing".to_string());
    }

    MatchReport {
        strengths,
        weaknesses,
        summary: result.explanation.clone(),
        source: MatchSource::Deterministic,
    }
}

/// Plan covering the first missing skills with generic resources
pub fn fallback_skill_gaps(missing: &[String]) -> SkillGapReport {
    if missing.is_empty() {
        return SkillGapReport {
            missing_skills: vec![],
            learning_plan: NO_GAPS_PLAN.to_string(),
            source: MatchSource::Deterministic,
        };
    }

    SkillGapReport {
        missing_skills: missing
            .iter()
            .take(MAX_FALLBACK_GAPS)
            .map(|skill| SkillGap {
                skill: skill.clone(),
                priority: GapPriority::Medium,
                resources: FALLBACK_RESOURCES.iter().map(|r| r.to_string()).collect(),
                time_estimate: FALLBACK_TIME_ESTIMATE.to_string(),
            })
            .collect(),
        learning_plan: FALLBACK_PLAN.to_string(),
        source: MatchSource::Deterministic,
    }
}

/// Report and skill-gap generator.
///
/// Without a scorer every report is the deterministic fallback.
#[derive(Clone, Default)]
pub struct MatchAdvisor {
    scorer: Option<Arc<dyn SemanticScorer>>,
}

impl MatchAdvisor {
    pub fn new(scorer: Arc<dyn SemanticScorer>) -> Self {
        Self {
            scorer: Some(scorer),
        }
    }

    pub async fn match_report(
        &self,
        profile: &CandidateProfile,
        posting: &JobPosting,
        result: &MatchResult,
    ) -> MatchReport {
        let Some(scorer) = &self.scorer else {
            return fallback_report(result);
        };

        let reply = scorer
            .complete(REPORT_SYSTEM_PROMPT, &build_report_prompt(profile, posting))
            .await;

        match reply.and_then(|text| parse_report(&text)) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Match report failed for {}, using fallback: {}", posting.id, e);
                fallback_report(result)
            }
        }
    }

    /// Learning plan for the required skills the candidate lacks
    pub async fn skill_gaps(&self, candidate_skills: &[String], missing: &[String]) -> SkillGapReport {
        if missing.is_empty() {
            return fallback_skill_gaps(missing);
        }
        let Some(scorer) = &self.scorer else {
            return fallback_skill_gaps(missing);
        };

        let reply = scorer
            .complete(GAP_SYSTEM_PROMPT, &build_gap_prompt(candidate_skills, missing))
            .await;

        match reply.and_then(|text| parse_skill_gaps(&text, missing)) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Skill-gap analysis failed, using fallback: {}", e);
                fallback_skill_gaps(missing)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubScores;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    struct ReplyScorer {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl ReplyScorer {
        fn new(reply: Result<&'static str, ()>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SemanticScorer for ReplyScorer {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, RefineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.map(str::to_string).map_err(|_| RefineError::Timeout)
        }
    }

    fn create_posting() -> JobPosting {
        JobPosting {
            id: "job-1".to_string(),
            title: "Data Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Berlin".to_string(),
            description: String::new(),
            required_skills: strings(&["Python", "Spark", "Kafka", "Airflow"]),
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

    fn create_result() -> MatchResult {
        MatchResult {
            job_id: "job-1".to_string(),
            score: 41,
            matched_skills: strings(&["Python"]),
            missing_skills: strings(&["Spark", "Kafka", "Airflow"]),
            subscores: SubScores {
                skills: 0.25,
                experience: 0.0,
                education: 0.0,
            },
            explanation: "Matched 1 of 4 required skills (Python).".to_string(),
            source: MatchSource::Deterministic,
            deterministic_score: 41,
        }
    }

    #[tokio::test]
    async fn test_report_from_model_reply() {
        let scorer = ReplyScorer::new(Ok(
            "```json\n{\"strengths\": [\"Python\", \" \", \"SQL\", \"Teamwork\", \"Extra\"], \"weaknesses\": [\"Spark\"], \"summary\": \"Decent fit.\"}\n```",
        ));
        let advisor = MatchAdvisor::new(scorer);

        let report = advisor
            .match_report(&CandidateProfile::default(), &create_posting(), &create_result())
            .await;

        assert_eq!(report.source, MatchSource::Semantic);
        assert_eq!(report.strengths, vec!["Python", "SQL", "Teamwork"]);
        assert_eq!(report.summary, "Decent fit.");
    }

    #[tokio::test]
    async fn test_report_falls_back_on_failure() {
        let result = create_result();

        for reply in [Err(()), Ok("no json at all"), Ok(r#"{"strengths": ["x"]}"#)] {
            let advisor = MatchAdvisor::new(ReplyScorer::new(reply));
            let report = advisor
                .match_report(&CandidateProfile::default(), &create_posting(), &result)
                .await;

            assert_eq!(report, fallback_report(&result));
            assert_eq!(report.source, MatchSource::Deterministic);
            assert_eq!(report.weaknesses.len(), 3);
            assert_eq!(report.summary, result.explanation);
        }
    }

    #[tokio::test]
    async fn test_skill_gaps_anchor_to_missing_skills() {
        let scorer = ReplyScorer::new(Ok(r#"{
            "missing_skills": [
                {"skill": "spark", "priority": "High", "resources": ["Spark docs"], "time_estimate": "3 weeks"},
                {"skill": "Haskell", "priority": "low", "resources": [], "time_estimate": "1 year"}
            ],
            "learning_plan": "Spark first."
        }"#));
        let advisor = MatchAdvisor::new(scorer);

        let report = advisor
            .skill_gaps(&strings(&["Python"]), &strings(&["Spark", "Kafka"]))
            .await;

        assert_eq!(report.source, MatchSource::Semantic);
        assert_eq!(report.missing_skills.len(), 1);
        assert_eq!(report.missing_skills[0].skill, "Spark");
        assert_eq!(report.missing_skills[0].priority, GapPriority::High);
        assert_eq!(report.learning_plan, "Spark first.");
    }

    #[tokio::test]
    async fn test_skill_gaps_fallback_covers_first_three() {
        let advisor = MatchAdvisor::new(ReplyScorer::new(Ok(
            r#"{"missing_skills": [{"skill": "Spark", "priority": "urgent"}]}"#,
        )));
        let missing = strings(&["Spark", "Kafka", "Airflow", "dbt"]);

        let report = advisor.skill_gaps(&strings(&["Python"]), &missing).await;

        assert_eq!(report.source, MatchSource::Deterministic);
        let skills: Vec<&str> = report.missing_skills.iter().map(|g| g.skill.as_str()).collect();
        assert_eq!(skills, vec!["Spark", "Kafka", "Airflow"]);
        assert!(report.missing_skills.iter().all(|g| g.priority == GapPriority::Medium));
    }

    #[tokio::test]
    async fn test_no_missing_skills_skips_the_backend() {
        let scorer = ReplyScorer::new(Err(()));
        let advisor = MatchAdvisor::new(Arc::clone(&scorer) as Arc<dyn SemanticScorer>);

        let report = advisor.skill_gaps(&strings(&["Python"]), &[]).await;

        assert!(report.missing_skills.is_empty());
        assert_eq!(report.learning_plan, NO_GAPS_PLAN);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_advisor_without_scorer_is_deterministic() {
        let advisor = MatchAdvisor::default();
        let result = create_result();

        let report = advisor
            .match_report(&CandidateProfile::default(), &create_posting(), &result)
            .await;
        assert_eq!(report, fallback_report(&result));

        let gaps = advisor.skill_gaps(&[], &result.missing_skills).await;
        assert_eq!(gaps.source, MatchSource::Deterministic);
        assert_eq!(gaps.missing_skills.len(), 3);
    }

    #[test]
    fn test_prompts_name_the_inputs() {
        let prompt = build_report_prompt(&CandidateProfile::default(), &create_posting());
        assert!(prompt.contains("Required skills: Python, Spark, Kafka, Airflow"));
        assert!(prompt.contains("\"strengths\""));

        let prompt = build_gap_prompt(&strings(&["Python"]), &strings(&["Spark", "Kafka"]));
        assert!(prompt.contains("Spark, Kafka"));
        assert!(prompt.contains("\"learning_plan\""));
    }
}
