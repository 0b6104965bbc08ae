use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledger::validate::Violations;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{auth::PasswordError, store::StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] JsonRejection),

    #[error("Malformed query: {0}")]
    MalformedQuery(#[from] QueryRejection),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Company required to access this resource")]
    CompanyRequired,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation failed: {0}")]
    Validation(#[from] Violations),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] StoreError),

    #[error("Internal error: {0}")]
    Password(#[from] PasswordError),
}

impl AppError {
    /// Unique key collisions are the client's problem, anything else is ours.
    pub fn on_duplicate(error: StoreError) -> Self {
        match error {
            StoreError::Duplicate(field) => {
                AppError::Conflict(format!("{} already exists", capitalize(field)))
            }
            other => AppError::Internal(other),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::MalformedPayload(_)
            | AppError::MalformedQuery(_)
            | AppError::CompanyRequired
            | AppError::Validation(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) | AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Validation(violations) => json!({ "errors": violations }),
            AppError::Internal(_) | AppError::Password(_) => {
                error!("Request failed: {self}");
                json!({ "message": "Internal server error" })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (AppError::CompanyRequired, StatusCode::BAD_REQUEST),
            (AppError::Forbidden("Not yours"), StatusCode::FORBIDDEN),
            (AppError::NotFound("Emission"), StatusCode::NOT_FOUND),
            (AppError::Conflict("Username already exists".into()), StatusCode::CONFLICT),
            (
                AppError::Internal(StoreError::Missing {
                    table: "emissions",
                    id: 1,
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_duplicates_become_conflicts() {
        let error = AppError::on_duplicate(StoreError::Duplicate("username"));

        assert_eq!(error.to_string(), "Username already exists");
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_messages() {
        assert_eq!(AppError::NotFound("Report").to_string(), "Report not found");
        assert_eq!(
            AppError::CompanyRequired.to_string(),
            "Company required to access this resource"
        );
    }
}
