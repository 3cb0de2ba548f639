use crate::models::MatchResult;

/// Drop results below `min_score` and order the rest best first.
///
/// The sort is stable, so equal scores keep their input order.
pub fn rank(mut results: Vec<MatchResult>, min_score: u8) -> Vec<MatchResult> {
    results.retain(|r| r.score >= min_score);
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchSource, SubScores};

    fn result(id: &str, score: u8) -> MatchResult {
        MatchResult {
            job_id: id.to_string(),
            score,
            matched_skills: vec![],
            missing_skills: vec![],
            subscores: SubScores {
                skills: 0.0,
                experience: 0.0,
                education: 0.0,
            },
            explanation: String::new(),
            source: MatchSource::Deterministic,
            deterministic_score: score,
        }
    }

    #[test]
    fn test_rank_filters_and_sorts() {
        let ranked = rank(
            vec![result("a", 40), result("b", 80), result("c", 20), result("d", 60)],
            30,
        );

        let ids: Vec<&str> = ranked.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![result("first", 70), result("second", 70), result("top", 90)], 0);

        let ids: Vec<&str> = ranked.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_rank_min_score_is_inclusive() {
        assert_eq!(rank(vec![result("a", 55)], 55).len(), 1);
        assert!(rank(vec![result("a", 54)], 55).is_empty());
    }
}
