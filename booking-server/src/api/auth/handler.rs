//! Login Handler

use axum::{Json, extract::State};
use shared::error::AppError;
use shared::models::{LoginRequest, LoginResponse};

use crate::api::ApiResult;
use crate::auth::password::{verify_dummy, verify_password};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::ok;

/// Authenticate and issue a bearer token.
///
/// Unknown email and wrong password fail identically, after the same amount
/// of hashing work.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let email = req
        .email
        .as_deref()
        .map(shared::util::normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::required("email"))?;
    let password = req
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::required("password"))?;

    let account = user::find_by_email(&state.pool, &email).await?;

    let account = match account {
        Some(account) if verify_password(&password, &account.password) => account,
        Some(_) => {
            tracing::warn!(email = %email, "Login failed - invalid credentials");
            return Err(AppError::invalid_credentials());
        }
        None => {
            verify_dummy(&password);
            tracing::warn!(email = %email, "Login failed - unknown account");
            return Err(AppError::invalid_credentials());
        }
    };

    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(&account.email, account.is_admin)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(email = %account.email, is_admin = account.is_admin, "User logged in");

    Ok(ok(LoginResponse {
        token,
        email: account.email,
        is_admin: account.is_admin,
        expires_in: jwt_service.expires_in_seconds(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{PASSWORD, test_app};
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_success_returns_usable_token() {
        let app = test_app().await;
        app.user("ann@example.com", false).await;

        let (status, body) = app
            .post(
                "/login",
                None,
                json!({"email": " Ann@Example.com ", "password": PASSWORD}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["email"], "ann@example.com");
        assert_eq!(body["data"]["is_admin"], false);
        assert_eq!(body["data"]["expires_in"], 30 * 24 * 3600);

        let token = body["data"]["token"].as_str().unwrap();
        let claims = app.state.get_jwt_service().validate_token(token).unwrap();
        assert_eq!(claims.sub, "ann@example.com");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let app = test_app().await;
        app.user("ann@example.com", false).await;

        let (wrong_status, wrong_body) = app
            .post(
                "/login",
                None,
                json!({"email": "ann@example.com", "password": "not-the-password"}),
            )
            .await;
        let (unknown_status, unknown_body) = app
            .post(
                "/login",
                None,
                json!({"email": "nobody@example.com", "password": "not-the-password"}),
            )
            .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
        assert_eq!(wrong_body["code"], 1002);

        let text = wrong_body.to_string();
        assert!(!text.contains("not-the-password"));
        assert!(!text.contains("ann@example.com"));
    }

    #[tokio::test]
    async fn test_login_requires_fields() {
        let app = test_app().await;
        let (status, body) = app.post("/login", None, json!({"email": "a@b.com"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "password");
    }
}
