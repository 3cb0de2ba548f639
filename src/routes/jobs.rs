use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::config::ConfigurationError;
use crate::core::{rank, Matcher};
use crate::models::{
    ErrorResponse, HealthResponse, MatchJobsRequest, MatchJobsResponse, MatchResult, MatchSource,
    ReportJobRequest, ReportJobResponse, ScoreJobsRequest, SearchJobsRequest, SearchJobsResponse,
    SearchQuery,
};
use crate::services::{JobCache, JobSource, MatchAdvisor, MatchPipeline};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<JobSource>,
    pub cache: Arc<JobCache>,
    pub matcher: Matcher,
    pub pipeline: MatchPipeline,
    pub advisor: MatchAdvisor,
    /// Applied when a request carries no `minScore`
    pub default_min_score: u8,
}

/// Configure all job-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/jobs/search", web::post().to(search_jobs))
        .route("/jobs/score", web::post().to(score_jobs))
        .route("/jobs/match", web::post().to(match_jobs))
        .route("/jobs/report", web::post().to(report_job));
}

fn validation_error(error: ConfigurationError) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: error.to_string(),
        status_code: 400,
    })
}

fn match_response(results: Vec<MatchResult>, total_postings: usize) -> MatchJobsResponse {
    let semantic_count = results
        .iter()
        .filter(|r| r.source == MatchSource::Semantic)
        .count();

    MatchJobsResponse {
        results,
        total_postings,
        semantic_count,
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        cache: state.cache.stats(),
    })
}

/// Search postings
///
/// POST /api/v1/jobs/search
///
/// Request body:
/// ```json
/// {
///   "keywords": "data scientist",
///   "location": "Berlin",
///   "experienceLevel": "entry",
///   "language": "English",
///   "limit": 20,
///   "remote": false
/// }
/// ```
async fn search_jobs(
    state: web::Data<AppState>,
    req: web::Json<SearchJobsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for search request: {:?}", errors);
        return validation_error(errors.into());
    }

    let query = SearchQuery::from(req.into_inner());
    tracing::info!("Searching postings for '{}'", query.keywords);

    let postings = state.source.search(&query).await;
    let synthetic = postings.iter().any(|p| p.synthetic);

    HttpResponse::Ok().json(SearchJobsResponse {
        total_results: postings.len(),
        synthetic,
        postings,
    })
}

/// Score caller-provided postings without fetching
///
/// POST /api/v1/jobs/score
async fn score_jobs(
    state: web::Data<AppState>,
    req: web::Json<ScoreJobsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for score request: {:?}", errors);
        return validation_error(errors.into());
    }

    let ScoreJobsRequest {
        profile,
        postings,
        min_score,
    } = req.into_inner();
    let total_postings = postings.len();

    let results = state.matcher.match_all(&profile, postings).await;
    let ranked = rank(results, min_score.unwrap_or(state.default_min_score));

    tracing::info!("Returning {} of {} scored postings", ranked.len(), total_postings);

    HttpResponse::Ok().json(match_response(ranked, total_postings))
}

/// Search, score and rank in one pass
///
/// POST /api/v1/jobs/match
async fn match_jobs(
    state: web::Data<AppState>,
    req: web::Json<MatchJobsRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for match request: {:?}", errors);
        return validation_error(errors.into());
    }

    let MatchJobsRequest {
        profile,
        query,
        min_score,
    } = req.into_inner();
    let query = SearchQuery::from(query);
    let min_score = min_score.unwrap_or(state.default_min_score);

    match state.pipeline.run(&profile, &query, min_score).await {
        Ok(outcome) => {
            tracing::info!(
                "Returning {} of {} matches for '{}'",
                outcome.results.len(),
                outcome.total_postings,
                query.keywords
            );
            HttpResponse::Ok().json(match_response(outcome.results, outcome.total_postings))
        }
        Err(e) => {
            tracing::error!("Match pipeline failed for '{}': {}", query.keywords, e);
            HttpResponse::GatewayTimeout().json(ErrorResponse {
                error: "Deadline exceeded".to_string(),
                message: e.to_string(),
                status_code: 504,
            })
        }
    }
}

/// Score one posting and explain the match
///
/// POST /api/v1/jobs/report
async fn report_job(
    state: web::Data<AppState>,
    req: web::Json<ReportJobRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for report request: {:?}", errors);
        return validation_error(errors.into());
    }

    let ReportJobRequest { profile, posting } = req.into_inner();
    let result = state.matcher.score_deterministic(&profile, &posting);

    let (report, skill_gaps) = tokio::join!(
        state.advisor.match_report(&profile, &posting, &result),
        state.advisor.skill_gaps(&profile.skills, &result.missing_skills)
    );

    tracing::info!(
        "Report for {}: score {}, {} skill gaps",
        posting.id,
        result.score,
        skill_gaps.missing_skills.len()
    );

    HttpResponse::Ok().json(ReportJobResponse {
        result,
        report,
        skill_gaps,
    })
}
