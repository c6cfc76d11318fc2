use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;

use crate::catalog::store::PatternCatalog;
use crate::cli::ServeArgs;
use crate::core::matches::ResolvedMatch;
use crate::core::pattern::{GroupSummary, PatternDefinition};
use crate::core::types::{AnalysisWarning, InputFormat};
use crate::matching::engine::{AnalysisConfig, AnalysisEngine, AnalysisError};
use crate::report::{AnalysisReport, GroupMetadata, ProcessingInfo};
use crate::utils::validation::{validate_filename, ValidationError, MAX_INPUT_BYTES};
use crate::web::format_detection::RequestedFormat;

/// Default page size for catalog listing
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Largest page size for catalog listing
pub const MAX_PAGE_LIMIT: usize = 500;

/// Request body limit; JSON escaping can double the size of a MOL block
pub const MAX_BODY_BYTES: usize = 2 * MAX_INPUT_BYTES + 4096;

/// Shared application state
pub struct AppState {
    pub engine: Arc<AnalysisEngine>,
}

impl AppState {
    fn catalog(&self) -> &PatternCatalog {
        self.engine.catalog()
    }
}

/// Enhanced error response
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub success: bool,
    pub error: String,
    pub error_type: String,
    pub details: Option<String>,
}

/// Create a safe error response that prevents information disclosure
/// while logging detailed errors server-side for debugging
pub fn create_safe_error_response(
    error_type: &str,
    user_message: &str,
    internal_error: Option<&str>,
) -> ErrorResponse {
    if let Some(internal_msg) = internal_error {
        tracing::error!("Internal error ({}): {}", error_type, internal_msg);
    }

    ErrorResponse {
        success: false,
        error: user_message.to_string(),
        error_type: error_type.to_string(),
        details: None,
    }
}

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

/// Body of `POST /api/analyze`
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub input: String,
    #[serde(default, rename = "type")]
    pub input_type: RequestedFormat,
    #[serde(default)]
    pub filename: Option<String>,
}

/// Successful analysis, flattened for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub input_type: InputFormat,
    pub molecular_formula: String,
    pub matches: Vec<String>,
    pub occurrences: Vec<ResolvedMatch>,
    pub total_matches: usize,
    pub groups_data: BTreeMap<String, GroupMetadata>,
    /// Base64 combined image
    pub image: Option<String>,
    pub image_media_type: Option<String>,
    /// Base64 image per group
    pub individual_images: BTreeMap<String, String>,
    pub warnings: Vec<AnalysisWarning>,
    pub processing_info: ProcessingInfo,
}

impl AnalyzeResponse {
    fn from_report(report: AnalysisReport, input_type: InputFormat) -> Self {
        let total_matches = report.total_matches();
        let (image, image_media_type) = match report.combined_image {
            Some(img) => (Some(img.data), Some(img.media_type)),
            None => (None, None),
        };
        Self {
            success: true,
            input_type,
            molecular_formula: report.molecular_formula,
            matches: report.matches,
            occurrences: report.occurrences,
            total_matches,
            groups_data: report.groups,
            image,
            image_media_type,
            individual_images: report
                .individual_images
                .into_iter()
                .map(|(name, img)| (name, img.data))
                .collect(),
            warnings: report.warnings,
            processing_info: report.processing,
        }
    }
}

/// Query parameters for catalog listing
#[derive(Debug, Deserialize)]
struct PageParams {
    offset: Option<usize>,
    limit: Option<usize>,
}

/// Full entry plus its place in the classification
#[derive(Serialize)]
struct GroupDetail {
    #[serde(flatten)]
    definition: PatternDefinition,
    hierarchical_path: String,
}

/// Run the web server
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the tokio runtime cannot be
/// created, or the server fails to start.
pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let catalog = match &args.catalog {
        Some(path) => PatternCatalog::load_from_file(path)?,
        None => PatternCatalog::load_embedded()?,
    };
    let config = AnalysisConfig {
        worker_threads: args.threads,
        ..AnalysisConfig::default()
    };
    let engine = Arc::new(AnalysisEngine::with_config(Arc::new(catalog), config));

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move { run_server(args, engine).await })
}

/// Routes and security layers, without rate limiting.
///
/// Rate limiting keys on the peer address, which only exists when the router
/// is served with connect info; [`create_router`] adds it.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/functional-groups", get(groups_handler))
        .route("/api/functional-groups/{name}", get(group_handler))
        .route("/api/search/{term}", get(search_handler))
        .route("/api/categories", get(categories_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                // Security headers for browser protection
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-content-type-options"),
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("x-frame-options"),
                    HeaderValue::from_static("DENY"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("referrer-policy"),
                    HeaderValue::from_static("strict-origin-when-cross-origin"),
                ))
                .layer(cors)
                // Request timeout to prevent slow client attacks
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(30),
                ))
                // Limit concurrent requests to prevent DOS
                .layer(ConcurrencyLimitLayer::new(100))
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
}

/// Create the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns an error if the rate limiter configuration is rejected.
pub fn create_router(engine: Arc<AnalysisEngine>) -> anyhow::Result<Router> {
    let state = Arc::new(AppState { engine });

    // 10 requests per second per IP, bursts of 50
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?;

    Ok(build_app(state).layer(GovernorLayer {
        config: Arc::new(governor_conf),
    }))
}

async fn run_server(args: ServeArgs, engine: Arc<AnalysisEngine>) -> anyhow::Result<()> {
    let groups = engine.catalog().len();
    let app = create_router(engine)?;

    let addr = format!("{}:{}", args.address, args.port);
    tracing::info!(groups, "Starting fg-analyzer web server at http://{addr}");
    println!("Starting fg-analyzer web server at http://{addr}");

    if args.open {
        if let Err(e) = open::that(format!("http://{addr}")) {
            tracing::warn!("Could not open browser: {e}");
        }
    }

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Service description
async fn index_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "fg-analyzer",
        "version": env!("CARGO_PKG_VERSION"),
        "total_groups": state.catalog().len(),
        "endpoints": {
            "GET /api/health": "Service status",
            "POST /api/analyze": "Analyze a molecule ({input, type?, filename?})",
            "GET /api/functional-groups": "List functional groups (?offset&limit)",
            "GET /api/functional-groups/{name}": "One functional group",
            "GET /api/search/{term}": "Search functional groups",
            "GET /api/categories": "All categories",
        },
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "analyzer_loaded": true,
        "total_groups": state.catalog().len(),
        "dropped_groups": state.catalog().load_warnings(),
    }))
}

/// API endpoint for analyzing a molecule
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let status = rejection.status();
            let error_type = if status == StatusCode::PAYLOAD_TOO_LARGE {
                "input_too_large"
            } else {
                "invalid_request"
            };
            return error_response(
                status,
                create_safe_error_response(error_type, "Request body must be JSON with an \"input\" field", None),
            );
        }
    };

    if let Some(name) = request.filename.as_deref() {
        if validate_filename(name).is_err() {
            return error_response(
                StatusCode::BAD_REQUEST,
                create_safe_error_response("invalid_filename", "Invalid filename", None),
            );
        }
    }

    let format = request
        .input_type
        .resolve(&request.input, request.filename.as_deref());
    let engine = Arc::clone(&state.engine);
    let input = request.input;

    let outcome = tokio::task::spawn_blocking(move || engine.analyze_input(&input, format)).await;

    match outcome {
        Ok(Ok(report)) => Json(AnalyzeResponse::from_report(report, format)).into_response(),
        Ok(Err(e)) => analysis_error_response(&e, format),
        Err(join_error) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            create_safe_error_response(
                "internal_error",
                "Analysis failed unexpectedly",
                Some(&join_error.to_string()),
            ),
        ),
    }
}

fn analysis_error_response(error: &AnalysisError, format: InputFormat) -> Response {
    let (status, error_type) = match error {
        AnalysisError::Parse(_) => (StatusCode::BAD_REQUEST, "parse_failed"),
        AnalysisError::Validation(ValidationError::EmptyInput) => (StatusCode::BAD_REQUEST, "empty_input"),
        AnalysisError::Validation(
            ValidationError::InputTooLarge { .. } | ValidationError::TooManyAtoms { .. },
        ) => (StatusCode::PAYLOAD_TOO_LARGE, "input_too_large"),
        AnalysisError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
    };
    tracing::debug!(%format, error = %error, "Rejected analysis request");

    let body = ErrorResponse {
        success: false,
        error: error.to_string(),
        error_type: error_type.to_string(),
        details: Some(format!("Input read as {format}")),
    };
    error_response(status, body)
}

/// List functional groups in catalog order
async fn groups_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Json<serde_json::Value> {
    let catalog = state.catalog();
    let offset = params.offset.unwrap_or(0);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT);

    let groups: Vec<GroupSummary> = catalog
        .groups()
        .iter()
        .skip(offset)
        .take(limit)
        .map(PatternDefinition::summary)
        .collect();

    Json(serde_json::json!({
        "total_groups": catalog.len(),
        "groups": groups,
        "categories": catalog.all_categories(),
        "offset": offset,
        "limit": limit,
    }))
}

async fn group_handler(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.catalog().get(&name) {
        Some(definition) => Json(GroupDetail {
            definition: definition.clone(),
            hierarchical_path: definition.hierarchical_path(),
        })
        .into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            create_safe_error_response("not_found", &format!("Functional group '{name}' not found"), None),
        ),
    }
}

async fn search_handler(
    State(state): State<Arc<AppState>>,
    Path(term): Path<String>,
) -> Json<serde_json::Value> {
    let results = state.catalog().search(&term);
    Json(serde_json::json!({
        "search_term": term,
        "count": results.len(),
        "results": results,
    }))
}

async fn categories_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "categories": state.catalog().all_categories(),
    }))
}
