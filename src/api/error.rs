use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::db::CreateUserError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Forbidden(String),

    Unauthorized(String),

    Conflict(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        // Repositories wrap DbErr in context; surface those as database
        // failures rather than generic internal errors.
        if err.downcast_ref::<sea_orm::DbErr>().is_some() {
            ApiError::DatabaseError(format!("{err:#}"))
        } else {
            ApiError::InternalError(err.to_string())
        }
    }
}

impl From<CreateUserError> for ApiError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::MissingField(_) => ApiError::ValidationError(err.to_string()),
            CreateUserError::Duplicate(_) => ApiError::Conflict(err.to_string()),
            CreateUserError::Internal(e) => ApiError::from(e),
        }
    }
}

impl ApiError {
    pub fn post_not_found(public_id: &str) -> Self {
        ApiError::NotFound(format!("Post {} not found", public_id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_db_errors_map_to_database_error() {
        let err: anyhow::Error = sea_orm::DbErr::Custom("disk I/O error".to_string()).into();
        assert!(matches!(ApiError::from(err), ApiError::DatabaseError(_)));

        // Context wrapping, as the repositories apply it, must not hide
        // the underlying DbErr
        let err = Err::<(), _>(sea_orm::DbErr::Custom("disk I/O error".to_string()))
            .context("Failed to query post by public ID")
            .unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::DatabaseError(_)));
    }

    #[test]
    fn test_other_errors_map_to_internal_error() {
        let err = anyhow::anyhow!("something unrelated");
        assert!(matches!(ApiError::from(err), ApiError::InternalError(_)));
    }
}
