use crate::aggregator::AggregateError;
use crate::resolver::ResolveError;
use crate::validation::ValidationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Could not resolve {0}")]
    NotFound(String),

    #[error("Could not resolve identifier, name resolution unavailable: {0}")]
    ResolverUnavailable(String),

    #[error("All providers are unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ResolverUnavailable(_) => StatusCode::FAILED_DEPENDENCY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound(name) => ApiError::NotFound(name),
            ResolveError::UpstreamUnavailable(reason) => ApiError::ResolverUnavailable(reason),
            ResolveError::Invalid(err) => err.into(),
        }
    }
}

impl From<AggregateError> for ApiError {
    fn from(err: AggregateError) -> Self {
        match err {
            AggregateError::AllProvidersUnavailable(reason) => ApiError::ServiceUnavailable(reason),
        }
    }
}
