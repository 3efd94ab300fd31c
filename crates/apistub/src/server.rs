use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::catalog::{load_catalog, ParsedRequest};
use crate::config::MatchStrategy;
use crate::fallback::{FallbackGenerator, FallbackReason};
use crate::matcher::{match_request, MatchOutcome};

/// Shared application state for the HTTP server.
pub struct AppState {
    /// Catalog file, re-read on every request.
    pub catalog_path: PathBuf,
    pub match_strategy: MatchStrategy,
    pub fallback: FallbackGenerator,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlInput {
    pub url: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", post(match_api))
        .with_state(state)
}

async fn match_api(
    State(state): State<Arc<AppState>>,
    Json(input): Json<UrlInput>,
) -> Result<Response, ApiError> {
    let input_url = input.url;
    let request = ParsedRequest::parse(&input_url);

    info!(base_url = %request.base_url, params = ?request.params, "Input received");

    let catalog = load_catalog(&state.catalog_path).await.map_err(|err| {
        error!(error = %err, "catalog unavailable");
        ApiError::internal(err.to_string())
    })?;

    let outcome = match_request(&input_url, &request, &catalog, state.match_strategy);
    info!(
        url = %input_url,
        entries = catalog.len(),
        strategy = state.match_strategy.as_str(),
        outcome = outcome.as_str(),
        "catalog lookup complete"
    );

    let reason = match outcome {
        MatchOutcome::Success(response) | MatchOutcome::KnownError(response) => {
            return Ok(Json(response).into_response());
        }
        MatchOutcome::ParamMismatch => FallbackReason::ParamMismatch,
        MatchOutcome::UrlNotFound => FallbackReason::UrlNotFound,
    };

    let catalog_text = serde_json::to_string_pretty(&catalog)
        .map_err(|err| ApiError::internal(format!("catalog encode failed: {err}")))?;

    let generated = state
        .fallback
        .generate_error(&input_url, &request.params, &catalog_text, reason)
        .await;

    Ok(Json(generated).into_response())
}
