use crate::auth::AuthError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use tracing::error;

/// User-visible error taxonomy. Store errors are logged server-side in full
/// and surfaced to the client as generic messages only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Login failure; deliberately identical for unknown email and wrong
    /// password.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("not found")]
    NotFound,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("conflict")]
    Conflict,

    /// Store failure on an authenticated user operation.
    #[error("request could not be processed")]
    Store,

    /// Store failure inside the analytical query catalog.
    #[error("error fetching data")]
    Query,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    /// Classify a store error raised on a user-path statement: unique
    /// violations are conflicts, anything else a generic store failure.
    pub fn from_store(err: tokio_postgres::Error) -> Self {
        if is_unique_violation(&err) {
            ApiError::Conflict
        } else {
            error!("store operation failed, error({err})");
            ApiError::Store
        }
    }

    /// Wrap a store error raised by a catalog query.
    pub fn from_query(err: tokio_postgres::Error) -> Self {
        error!("catalog query failed, error({err})");
        ApiError::Query
    }
}

pub fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION)
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        error!("failed to get connection from pool, error({err})");
        ApiError::Internal
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_)
            | ApiError::DuplicateEmail
            | ApiError::Conflict
            | ApiError::Store => StatusCode::BAD_REQUEST,
            ApiError::Query | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Auth(AuthError::Malformed).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::DuplicateEmail.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Store.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Query.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn client_bodies_are_generic() {
        // store failures must never leak statement text or driver detail
        assert_eq!(ApiError::Store.to_string(), "request could not be processed");
        assert_eq!(ApiError::Query.to_string(), "error fetching data");
    }
}
