//! Public login endpoint.
//!
//! # Invariants
//! - The `x-tenant-id` header is checked before the body is parsed.
//! - The tenant is resolved before the body is validated, so tenant
//!   problems answer the same way regardless of credentials.

use crate::api::error::ApiError;
use crate::api::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::Json;
use log::info;
use samacarnet_core::model::tenant::TenantId;
use samacarnet_core::{AuthService, UserSummary};
use serde::{Deserialize, Serialize};

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Tenant id taken from the `x-tenant-id` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantHeader(pub TenantId);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantHeader {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(TENANT_HEADER)
            .ok_or(ApiError::MissingTenant)?;
        let text = raw.to_str().map_err(|_| ApiError::InvalidTenantId)?.trim();
        if text.is_empty() {
            return Err(ApiError::MissingTenant);
        }
        text.parse::<TenantId>()
            .ok()
            .filter(|id| *id > 0)
            .map(TenantHeader)
            .ok_or(ApiError::InvalidTenantId)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub data: LoginData,
}

/// `POST /api/v1/public/auth/login`
pub async fn login(
    TenantHeader(tenant_id): TenantHeader,
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request = body.ok().map(|Json(request)| request);
    let token_ttl_ms = state.token_ttl_ms();
    let outcome = state
        .with_conn(move |conn| {
            let auth = AuthService::with_token_ttl(conn, token_ttl_ms);
            auth.check_tenant(tenant_id)?;
            let request = request
                .filter(|req| !req.email.trim().is_empty() && !req.password.is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest("Email and password are required".to_string())
                })?;
            auth.login(tenant_id, &request.email, &request.password)
                .map_err(ApiError::from)
        })
        .await?;

    info!(
        "event=http_login module=api status=ok tenant_id={tenant_id} user_id={}",
        outcome.user.id
    );
    Ok(Json(LoginResponse {
        success: true,
        data: LoginData {
            token: outcome.token,
            user: outcome.user,
        },
    }))
}
