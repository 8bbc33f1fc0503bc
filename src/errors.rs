use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Per-field validation failures, accumulated rather than fail-fast.
    #[error("validation failed")]
    Fields(BTreeMap<String, String>),

    #[error("{0}")]
    Validation(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid email or password")]
    Auth,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Access denied")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Password error: {0}")]
    Password(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Fields(_)
            | ApiError::Validation(_)
            | ApiError::EmptyCart
            | ApiError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth | ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_)
            | ApiError::Template(_)
            | ApiError::Password(_)
            | ApiError::Session(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = match self {
            ApiError::Fields(errors) => json!({ "errors": errors }),
            _ if status.is_server_error() => {
                log::error!("Internal error: {}", self);
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(status).json(body)
    }
}

impl From<ApiError> for std::io::Error {
    fn from(err: ApiError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}
