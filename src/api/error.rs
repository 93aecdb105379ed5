//! Mapping of ladder errors onto HTTP responses

use crate::error::LadderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Error returned by API handlers, rendered as `{ "error": message }`
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    /// Status code chosen from the underlying ladder error, 500 otherwise
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<LadderError>() {
            Some(
                LadderError::CompetitorNotFound { .. }
                | LadderError::CategoryNotFound { .. }
                | LadderError::MatchNotFound { .. }
                | LadderError::TournamentResultNotFound { .. },
            ) => StatusCode::NOT_FOUND,
            Some(
                LadderError::InvalidMatch { .. }
                | LadderError::InvalidInput { .. }
                | LadderError::InvalidMerge { .. },
            ) => StatusCode::BAD_REQUEST,
            Some(LadderError::DuplicateCategory { .. } | LadderError::UrlPathTaken { .. }) => {
                StatusCode::CONFLICT
            }
            Some(LadderError::ComputationTimeout { .. }) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
