// Copyright (c) Plateful Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::db::DbPoolError;

/// Error taxonomy for every core operation. Each request either succeeds or
/// fails with exactly one of these kinds; none is fatal to the process.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid bearer credential
    #[error("{0}")]
    Unauthenticated(String),

    /// Malformed or missing input, caller-fixable
    #[error("{0}")]
    Validation(String),

    /// Referenced entity absent or not addressable by the caller
    #[error("{0}")]
    NotFound(String),

    /// Entity exists but the caller lacks the required relationship or role
    #[error("{0}")]
    Forbidden(String),

    /// An equivalent friendship row already exists between the pair
    #[error("{0}")]
    DuplicateRequest(String),

    /// A pending or accepted membership row already exists for the pair
    #[error("{0}")]
    DuplicateInvite(String),

    /// Structurally nonsensical target, e.g. self-friending
    #[error("{0}")]
    InvalidTarget(String),

    /// Structurally nonsensical operation, e.g. removing the group creator
    #[error("{0}")]
    InvalidOperation(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] DbPoolError),

    #[error("places search failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_)
            | ApiError::DuplicateRequest(_)
            | ApiError::DuplicateInvite(_)
            | ApiError::InvalidTarget(_)
            | ApiError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            // A lookup that expected a row and found none surfaces as 404
            ApiError::Database(diesel::result::Error::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_)
            | ApiError::Pool(_)
            | ApiError::Upstream(_)
            | ApiError::Token(_)
            | ApiError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("request failed: {}", self);
        }

        let message = if status.is_server_error() {
            // Internal details stay in the logs
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        assert_eq!(
            ApiError::Unauthenticated("no token".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateRequest("dup".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::DuplicateInvite("dup".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidTarget("self".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidOperation("creator".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("nope".into()).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn diesel_not_found_maps_to_404() {
        let err = ApiError::Database(diesel::result::Error::NotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_database_errors_map_to_500() {
        let err = ApiError::Database(diesel::result::Error::BrokenTransactionManager);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
