//! HTTP route table.

use crate::api::endpoints;
use crate::api::state::AppState;
use axum::routing::{get, post};
use axum::Router;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/api/v1/public/auth/login", post(endpoints::auth::login))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use samacarnet_core::db::open_db_in_memory;
    use samacarnet_core::model::tenant::{Tenant, TenantStatus};
    use samacarnet_core::model::user::{RoleName, User};
    use samacarnet_core::password::hash_password_with_iterations;
    use samacarnet_core::repo::tenant_repo::{SqliteTenantRepository, TenantRepository};
    use samacarnet_core::repo::user_repo::{RoleRepository, SqliteUserRepository, UserRepository};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PASSWORD: &str = "s3cret-pass";

    /// Router over a fresh database with one active tenant and one doctor.
    fn app() -> (Router, i64) {
        let conn = open_db_in_memory().unwrap();
        let tenant_id = SqliteTenantRepository::new(&conn)
            .create_tenant(&Tenant::new("Clinique Test", "clinique-test"))
            .unwrap();
        let users = SqliteUserRepository::new(&conn);
        let role_id = users.ensure_role(RoleName::Doctor, None).unwrap();
        users
            .create_user(&User::new(
                Some(tenant_id),
                role_id,
                "dr.diop@clinique.sn",
                hash_password_with_iterations(PASSWORD, 1_000),
                "Moussa",
                "Diop",
            ))
            .unwrap();
        (build_router(AppState::new(conn, 60_000)), tenant_id)
    }

    fn login_request(tenant: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/public/auth/login")
            .header("content-type", "application/json");
        if let Some(tenant) = tenant {
            builder = builder.header("x-tenant-id", tenant);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn credentials(password: &str) -> Value {
        json!({"email": "dr.diop@clinique.sn", "password": password})
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_running() {
        let (app, _) = app();
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, json) = send(app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"success": true, "message": "SamaCarnet API is running"})
        );
    }

    #[tokio::test]
    async fn login_without_tenant_header_is_bad_request() {
        let (app, _) = app();

        let (status, json) = send(app, login_request(None, credentials(PASSWORD))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json,
            json!({"success": false, "message": "Tenant ID is required"})
        );
    }

    #[tokio::test]
    async fn login_with_non_numeric_tenant_is_bad_request() {
        let (app, _) = app();

        let (status, json) = send(app, login_request(Some("abc"), credentials(PASSWORD))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Invalid tenant ID");
    }

    #[tokio::test]
    async fn login_with_unknown_tenant_is_unauthorized_even_with_valid_credentials() {
        let (app, _) = app();

        let (status, json) = send(app, login_request(Some("999"), credentials(PASSWORD))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Invalid tenant");
    }

    #[tokio::test]
    async fn login_with_bad_password_is_unauthorized() {
        let (app, tenant_id) = app();
        let tenant = tenant_id.to_string();

        let (status, json) =
            send(app, login_request(Some(&tenant), credentials("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn login_with_valid_credentials_returns_token_and_user() {
        let (app, tenant_id) = app();
        let tenant = tenant_id.to_string();

        let (status, json) = send(app, login_request(Some(&tenant), credentials(PASSWORD))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert!(json["data"]["token"].as_str().is_some_and(|t| !t.is_empty()));
        let user = &json["data"]["user"];
        assert_eq!(user["role"], "doctor");
        assert_eq!(user["email"], "dr.diop@clinique.sn");
        assert_eq!(user["firstName"], "Moussa");
        assert_eq!(user["lastName"], "Diop");
        assert_eq!(user["tenantId"], tenant_id);
    }

    #[tokio::test]
    async fn login_against_suspended_tenant_is_unauthorized() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTenantRepository::new(&conn);
        let mut tenant = Tenant::new("Clinique Fermée", "clinique-fermee");
        tenant.status = TenantStatus::Suspended;
        let tenant_id = repo.create_tenant(&tenant).unwrap();
        let app = build_router(AppState::new(conn, 60_000));

        let tenant = tenant_id.to_string();
        let (status, json) = send(app, login_request(Some(&tenant), credentials(PASSWORD))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Tenant is not active");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request_with_envelope() {
        let (app, tenant_id) = app();
        let tenant = tenant_id.to_string();

        let (status, json) = send(app, login_request(Some(&tenant), json!({"email": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn unknown_tenant_wins_over_empty_credentials() {
        let (app, _) = app();

        let body = json!({"email": "", "password": ""});
        let (status, json) = send(app, login_request(Some("999"), body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid tenant");
    }

    #[tokio::test]
    async fn unknown_tenant_wins_over_malformed_body() {
        let (app, _) = app();

        let (status, json) = send(app, login_request(Some("999"), json!({"email": 1}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["message"], "Invalid tenant");
    }

    #[tokio::test]
    async fn empty_credentials_on_known_tenant_are_bad_request() {
        let (app, tenant_id) = app();
        let tenant = tenant_id.to_string();

        let body = json!({"email": " ", "password": ""});
        let (status, json) = send(app, login_request(Some(&tenant), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Email and password are required");
    }
}
