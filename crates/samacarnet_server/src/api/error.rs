//! API error type and the public failure envelope.
//!
//! Every failure renders as `{ "success": false, "message": ... }`.
//! Internal details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use samacarnet_core::AuthError;
use serde::Serialize;

/// Failure body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Tenant ID is required")]
    MissingTenant,
    #[error("Invalid tenant ID")]
    InvalidTenantId,
    #[error("Invalid tenant")]
    UnknownTenant,
    #[error("Tenant is not active")]
    TenantInactive,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTenant | Self::InvalidTenantId | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UnknownTenant | Self::TenantInactive | Self::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::BadRequest(detail) => detail.clone(),
            Self::Internal(detail) => {
                error!("event=http_error module=api status=error detail={detail}");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            success: false,
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UnknownTenant(_) => Self::UnknownTenant,
            AuthError::TenantInactive(_) => Self::TenantInactive,
            AuthError::InvalidCredentials | AuthError::InvalidToken => Self::InvalidCredentials,
            AuthError::Repo(err) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_tenant_is_bad_request_with_envelope() {
        let (status, json) = body_json(ApiError::MissingTenant).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            serde_json::json!({"success": false, "message": "Tenant ID is required"})
        );
    }

    #[tokio::test]
    async fn internal_detail_is_not_leaked() {
        let (status, json) = body_json(ApiError::Internal("disk I/O error".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[test]
    fn auth_errors_map_to_unauthorized() {
        assert_eq!(
            ApiError::from(AuthError::UnknownTenant(999)).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::TenantInactive(1)).to_string(),
            "Tenant is not active"
        );
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::InvalidCredentials
        ));
    }
}
