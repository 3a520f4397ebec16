//! HTTP error responses.
//!
//! Every failure becomes a `{"response": "<message>"}` body. Client
//! rejections get their own message and a 4xx status; server failures get
//! a generic message and a 500, with the full report logged.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use helmsman_dispatch::DispatchError;
use rootcause::prelude::Report;
use serde::Serialize;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub response: String,
}

/// Errors returned by request handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The dispatcher rejected or failed the query.
    Dispatch(Report<DispatchError>),
    /// The request body was not a valid query.
    InvalidBody(JsonRejection),
}

impl From<Report<DispatchError>> for ApiError {
    fn from(report: Report<DispatchError>) -> Self {
        Self::Dispatch(report)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Dispatch(report) => {
                let error = report.current_context();
                if error.is_client_error() {
                    tracing::info!(error = %error, "query rejected");
                    (StatusCode::UNPROCESSABLE_ENTITY, error.user_message().to_string())
                } else {
                    tracing::error!(error = %report, "query failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, error.user_message().to_string())
                }
            }
            Self::InvalidBody(rejection) => {
                tracing::debug!(error = %rejection, "invalid request body");
                (rejection.status(), rejection.body_text())
            }
        };

        (status, Json(ErrorBody { response: message })).into_response()
    }
}
