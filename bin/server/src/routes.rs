//! Router and request handlers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use helmsman_dispatch::{QueryRequest, QueryResponse};
use tower_http::trace::TraceLayer;

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/v1/query", post(query))
        .route("/v1/debug/query", post(debug_query))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Classifies a question and answers it.
pub async fn query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.dispatcher.handle(request).await?;
    Ok(Json(response))
}

/// Sends a question straight to the model.
pub async fn debug_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    let response = state.dispatcher.handle_raw(request).await?;
    Ok(Json(response))
}
