use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::StoreError;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Ok(())) => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
        Some(Err(value)) => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Failed to process request"
        ),
        None => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request, but no Response extension is set"
        ),
    }

    response
}

#[derive(Clone, Debug)]
pub enum ApiError {
    TransactionCreationFailed,
    PasswordHashFailed(String),
    General(String),
    TokenGenerationFailed(String),
    DbError(String),
    ValidationFail(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::TransactionCreationFailed => f.write_str("Failed to create transaction"),
            ApiError::PasswordHashFailed(value) => write!(f, "Failed to hash password {value}"),
            ApiError::General(value) => f.write_str(value),
            ApiError::TokenGenerationFailed(value) => {
                write!(f, "Failed to generate token: {value}")
            }
            ApiError::DbError(value) => write!(f, "Database error: {value}"),
            ApiError::ValidationFail(value) => write!(f, "Failed to validate: {value}"),
        }
    }
}

impl From<&StoreError> for ApiError {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Database(db_err) => ApiError::DbError(db_err.to_string()),
            StoreError::PasswordHash(value) => ApiError::PasswordHashFailed(value.clone()),
            StoreError::InvalidInput(value) => ApiError::ValidationFail(value.clone()),
            other => ApiError::General(other.to_string()),
        }
    }
}

pub fn to_response<T: IntoResponse>(
    response: T,               //The response that we are sending + StatusCode
    ext: Result<(), ApiError>, //The extension, that we want to give logging middleware
) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(ext);

    response
}

/// Maps a repository failure onto a status code and an `{"error": ...}` body.
pub fn store_error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::NotFound { .. } | StoreError::InvalidOrderId => StatusCode::NOT_FOUND,
        StoreError::InsufficientCandidates { .. } | StoreError::Conflict(_) => {
            StatusCode::CONFLICT
        }
        StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StoreError::PasswordHash(_) | StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_owned()
    } else {
        err.to_string()
    };

    to_response(
        (status, Json(json!({ "error": message }))),
        Err(ApiError::from(&err)),
    )
}

/// `200 OK` with a JSON body.
pub fn ok_json<T: serde::Serialize>(value: T) -> Response {
    to_response((StatusCode::OK, Json(value)), Ok(()))
}

/// A status with a `{"message": ...}` body.
pub fn message_response(status: StatusCode, message: &str) -> Response {
    to_response((status, Json(json!({ "message": message }))), Ok(()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (
                StoreError::NotFound {
                    entity: "book",
                    id: 1,
                },
                StatusCode::NOT_FOUND,
            ),
            (StoreError::InvalidOrderId, StatusCode::NOT_FOUND),
            (
                StoreError::InsufficientCandidates {
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                StoreError::InvalidInput("bad".to_owned()),
                StatusCode::BAD_REQUEST,
            ),
            (
                StoreError::Conflict("taken".to_owned()),
                StatusCode::CONFLICT,
            ),
        ];

        for (err, expected) in cases {
            let response = store_error_response(err);
            assert_eq!(response.status(), expected);
            assert!(matches!(
                response.extensions().get::<Result<(), ApiError>>(),
                Some(Err(_))
            ));
        }
    }
}
