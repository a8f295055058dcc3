//! HTTP route definitions

use axum::{
    extract::{Extension, Path, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::{require_auth, AuthenticatedUser};
use crate::matches::{MatchError, MatchResponse, ScoreResponse, ServerChoice};
use crate::scoring::ScoreError;
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (live scoreboards read without auth)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/matches", get(list_matches_handler))
        .route("/matches/:id", get(get_match_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/matches", post(create_match_handler))
        .route("/matches/:id/score", post(score_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    store: &'static str,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        store: state.matches.store().backend(),
    })
}

// ============================================================================
// Match endpoints
// ============================================================================

async fn list_matches_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<MatchResponse>>, AppError> {
    let matches = state.matches.list_matches().await?;
    Ok(Json(matches.iter().map(MatchResponse::from).collect()))
}

async fn get_match_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchResponse>, AppError> {
    let record = state.matches.get_match(id).await?;
    Ok(Json(MatchResponse::from(&record)))
}

#[derive(Deserialize)]
struct CreateMatchRequest {
    player1_name: String,
    player2_name: String,
    #[serde(default)]
    first_server: ServerChoice,
}

async fn create_match_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(req): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchResponse>), AppError> {
    let record = state
        .matches
        .create_match(auth.user_id, &req.player1_name, &req.player2_name, req.first_server)
        .await?;

    Ok((StatusCode::CREATED, Json(MatchResponse::from(&record))))
}

#[derive(Deserialize)]
struct ScoreRequest {
    /// Raw identifier, validated by the service (1 or 2)
    scoring_player: i64,
}

async fn score_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if state.score_limiter.check_key(&id).is_err() {
        warn!(match_id = %id, "Score submission rate limited");
        return Err(AppError::RateLimited);
    }

    let (record, outcome) = state
        .matches
        .score_point(id, auth.user_id, req.scoring_player)
        .await?;

    Ok(Json(ScoreResponse {
        game_match: MatchResponse::from(&record),
        outcome,
    }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Internal error")]
    Internal,
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NotFound(_) => AppError::NotFound("Match not found".to_string()),
            MatchError::Forbidden => AppError::Forbidden(err.to_string()),
            MatchError::Conflict(_) => AppError::Conflict(err.to_string()),
            MatchError::Validation(msg) => AppError::BadRequest(msg),
            MatchError::Score(ScoreError::InvalidInput(msg)) => AppError::BadRequest(msg),
            MatchError::Score(ScoreError::IllegalTransition(_)) => {
                AppError::BadRequest("match already finished".to_string())
            }
            MatchError::Store(e) => {
                error!(error = %e, "Store failure");
                AppError::Internal
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
