use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use job_matcher::config::{ConfigurationError, LoggingSettings, Settings};
use job_matcher::core::Matcher;
use job_matcher::models::ScoringWeights;
use job_matcher::routes::{self, jobs::AppState};
use job_matcher::services::{
    JobCache, JobSource, MatchAdvisor, MatchPipeline, SemanticClient, SemanticRefiner, SemanticScorer,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL / LOG_FORMAT override the configured logging section
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load().map_err(ConfigurationError::from) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting job matcher service...");

    let cache = Arc::new(JobCache::new(
        settings.cache.max_entries,
        settings.cache.ttl_secs,
    ));

    info!(
        "Search cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    let source = match JobSource::new(settings.job_board.clone(), Arc::clone(&cache)) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("Failed to initialize job source: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    info!("Job source initialized ({})", settings.job_board.base_url);

    let weights = ScoringWeights::from(&settings.scoring.weights);
    let mut matcher = Matcher::new(weights)
        .with_max_concurrency(settings.matching.max_concurrency)
        .with_deadline(Duration::from_secs(settings.matching.deadline_secs));

    let mut advisor = MatchAdvisor::default();

    if settings.semantic.enabled {
        let threshold = settings.semantic.promotion_threshold;
        match SemanticClient::new(settings.semantic.clone()) {
            Ok(client) => {
                let scorer: Arc<dyn SemanticScorer> = Arc::new(client);
                matcher = matcher.with_refiner(SemanticRefiner::new(Arc::clone(&scorer), threshold));
                advisor = MatchAdvisor::new(scorer);
                info!("Semantic refinement enabled (model: {}, threshold: {})", settings.semantic.model, threshold);
            }
            Err(e) => warn!("Semantic client unavailable, scoring deterministically: {}", e),
        }
    }

    info!("Matcher initialized with weights: {:?}", weights);

    let app_state = AppState {
        pipeline: MatchPipeline::new(Arc::clone(&source), matcher.clone()),
        advisor,
        source,
        cache,
        matcher,
        default_min_score: settings.matching.min_score,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
