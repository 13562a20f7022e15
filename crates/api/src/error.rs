use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use infra::{ClaimError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthenticated(String),

    /// Storage failure. The message is generic; the cause is logged where
    /// the error is created.
    #[error("{0}")]
    Infra(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Unauthenticated(_) => "UNAUTHENTICATED",
            AppError::Infra(_) => "INFRA",
        }
    }

    /// Only infrastructure failures are worth retrying unchanged.
    pub fn retryable(&self) -> bool {
        matches!(self, AppError::Infra(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Infra(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Log the store failure and hide its detail from the caller.
    pub fn infra(message: &str, cause: &StoreError) -> Self {
        tracing::error!(error = %cause, "{message}");
        AppError::Infra(message.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::infra("storage unavailable", &e)
    }
}

impl From<ClaimError> for AppError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::NoSlots => AppError::Validation("no slots provided".to_string()),
            ClaimError::UnknownSlots(ids) => {
                AppError::Validation(format!("invalid slot reference: {}", join_ids(&ids)))
            }
            ClaimError::SlotsTaken(ids) => {
                AppError::Conflict(format!("slot already taken: {}", join_ids(&ids)))
            }
            ClaimError::Store(e) => AppError::infra("reservation failed", &e),
        }
    }
}

pub(crate) fn join_ids(ids: &[uuid::Uuid]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
                code: self.code(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn taken_slots_map_to_conflict() {
        let id = Uuid::new_v4();
        let err = AppError::from(ClaimError::SlotsTaken(vec![id]));
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert!(err.to_string().contains(&id.to_string()));
        assert!(!err.retryable());
    }

    #[test]
    fn store_failures_are_retryable_and_generic() {
        let err = AppError::from(ClaimError::Store(StoreError::Unavailable(
            "connection refused on 10.0.0.3".to_string(),
        )));
        assert_eq!(err.code(), "INFRA");
        assert!(err.retryable());
        assert_eq!(err.to_string(), "reservation failed");
    }

    #[test]
    fn unknown_slots_are_validation_errors() {
        let err = AppError::from(ClaimError::UnknownSlots(vec![Uuid::new_v4()]));
        assert_eq!(err.code(), "VALIDATION");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
