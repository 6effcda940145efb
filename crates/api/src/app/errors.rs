use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use cutlery_core::DomainError;
use cutlery_infra::StoreError;

/// Failure of a service operation, as seen by the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing/ill-typed input. Nothing was written.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// The store failed; the message is passed through to the caller.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(e) => {
                tracing::info!(error = %e, "rejected request");
                json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "store operation failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
            }
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "code": code,
        })),
    )
        .into_response()
}

/// Extractor rejection (bad query string, unreadable or oversized body).
pub fn rejection(status: StatusCode, message: String) -> Response {
    tracing::info!(%status, error = %message, "rejected request");
    json_error(status, "invalid_request", message)
}

pub async fn method_not_allowed() -> Response {
    json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Method not allowed",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let res = ServiceError::from(DomainError::missing("forks")).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn store_failure_maps_to_server_error() {
        let res = ServiceError::from(StoreError::Unavailable("down".into())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "store unavailable: down");
        assert_eq!(body["code"], "store_error");
    }
}
