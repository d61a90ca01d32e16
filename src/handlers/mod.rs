//! HTTP API: phrase matching, the instructions page and a health check.

pub mod error;
pub mod state;

use axum::{
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::RankedMatch;
use crate::templates::InstructionsContext;
pub use error::{ApiError, AppError};
pub use state::AppState;

const EXAMPLE_PHRASE: &str = "river_discharge";

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub results: Vec<RankedMatch>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub uptime_seconds: u64,
    pub total_requests: u64,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(instructions))
        .route("/health", get(health_check))
        .route("/match_phrase", get(instructions))
        .route("/match_phrase/", get(instructions))
        .route("/match_phrase/:phrase", get(match_phrase))
        .route("/:phrase", get(match_phrase))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Letters and underscores only; the empty phrase is accepted.
pub fn is_valid_phrase(phrase: &str) -> bool {
    static PHRASE: OnceLock<Regex> = OnceLock::new();
    PHRASE
        .get_or_init(|| Regex::new(r"^[A-Za-z_]*$").expect("static regex"))
        .is_match(phrase)
}

pub async fn match_phrase(
    State(state): State<Arc<AppState>>,
    Path(phrase): Path<String>,
) -> Result<Response, AppError> {
    state.increment_requests();
    let request_id = Uuid::new_v4();

    if !is_valid_phrase(&phrase) {
        warn!(%request_id, "Rejected phrase '{}'", phrase);
        return Ok(Html(format!("invalid input ... {}", html_escape::encode_text(&phrase))).into_response());
    }

    info!(%request_id, "Matching phrase '{}'", phrase);
    let results = state.matcher.match_phrase(&phrase).await.map_err(|e| {
        error!(%request_id, "Matching '{}' failed: {:#}", phrase, e);
        AppError::Upstream(format!("{:#}", e))
    })?;

    Ok((
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "GET"),
        ],
        Json(MatchResponse { results }),
    )
        .into_response())
}

pub async fn instructions(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    state.increment_requests();

    let page = state.templates.instructions(&InstructionsContext {
        name: state.config.name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        example: EXAMPLE_PHRASE.to_string(),
        max_results: state.matcher.settings().max_results,
        backend: state.matcher.backend().describe(),
    })?;

    Ok(Html(page))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.increment_requests();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.matcher.backend().describe(),
        uptime_seconds: state.uptime_secs(),
        total_requests: state.get_request_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phrase_validation() {
        assert!(is_valid_phrase("river_discharge"));
        assert!(is_valid_phrase("River__Depth"));
        assert!(is_valid_phrase(""));
        assert!(!is_valid_phrase("river-discharge"));
        assert!(!is_valid_phrase("river discharge"));
        assert!(!is_valid_phrase("<script>"));
        assert!(!is_valid_phrase("flüss"));
    }

    #[test]
    fn test_upstream_error_body() {
        let error = ApiError::upstream().with_details("timeout");
        let json = serde_json::to_value(&error).unwrap();

        assert_eq!(json["code"], "UPSTREAM_ERROR");
        assert_eq!(json["details"], "timeout");
    }
}
