use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use affinity_service::{
	BatchSearchRequest, BatchSearchResponse, Error as ServiceError, FacetsResponse, PagedResult,
	SearchRequest,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/facets", get(facets))
		.route("/v1/search", post(search))
		.route("/v1/batch_search", post(batch_search))
		.with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
	status: &'static str,
	message: &'static str,
}

async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "ok", message: "Affinity Search API is healthy." })
}

async fn facets(State(state): State<AppState>) -> Result<Json<FacetsResponse>, ApiError> {
	let response = state.service.facets().await?;
	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<PagedResult>, ApiError> {
	let response = state.service.search(payload).await?;
	Ok(Json(response))
}

async fn batch_search(
	State(state): State<AppState>,
	Json(payload): Json<BatchSearchRequest>,
) -> Result<Json<BatchSearchResponse>, ApiError> {
	let response = state.service.batch_search(payload).await?;
	Ok(Json(response))
}

/// Error envelope returned to callers. `error` carries backend detail for
/// server-side failures and is omitted for plain client errors; stack
/// traces never leave the process.
#[derive(Debug, Serialize)]
struct ErrorBody {
	detail: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	error: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	detail: String,
	error: Option<String>,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => {
				Self { status: StatusCode::BAD_REQUEST, detail: message, error: None }
			},
			ServiceError::Provider { message } => {
				tracing::error!(error = %message, "Embedding backend error.");
				Self {
					status: StatusCode::BAD_GATEWAY,
					detail: "Embedding backend error.".to_string(),
					error: Some(message),
				}
			},
			ServiceError::Qdrant { message } => {
				tracing::error!(error = %message, "Search backend error.");
				Self {
					status: StatusCode::SERVICE_UNAVAILABLE,
					detail: "Search backend error.".to_string(),
					error: Some(message),
				}
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { detail: self.detail, error: self.error };

		(self.status, Json(body)).into_response()
	}
}
