use crate::thing::ThingError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Thing(#[from] ThingError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Thing(e) => match e {
                ThingError::ThingNotFound(_)
                | ThingError::ActionNotFound(_)
                | ThingError::PropertyNotFound(_)
                | ThingError::EventNotFound(_)
                | ThingError::ActionIdNotFound(_) => StatusCode::NOT_FOUND,
                ThingError::InvalidValue { .. } | ThingError::InvalidInput { .. } => {
                    StatusCode::BAD_REQUEST
                }
                ThingError::ReadOnly(_) => StatusCode::FORBIDDEN,
                ThingError::QueueFull | ThingError::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
                ThingError::DuplicateName(_) => StatusCode::CONFLICT,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (self.status(), body).into_response()
    }
}
