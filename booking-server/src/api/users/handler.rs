//! User Handlers
//!
//! Accounts are keyed by normalized email. Passwords are only ever stored as
//! argon2 hashes and never returned.

use axum::{Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{ChangePassword, User, UserCreate, UserUpdate};

use crate::api::ApiResult;
use crate::api::convert::not_found_as;
use crate::auth::CurrentUser;
use crate::auth::password::{MAX_PASSWORD_LEN, MIN_PASSWORD_LEN, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::RepoError;
use crate::db::repository::user::{self, NewUser, ProfileChanges};
use crate::utils::ok;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, require_email, validate_optional_text,
};

fn validate_new_password(password: Option<&str>, field: &str) -> Result<String, AppError> {
    let password = password.ok_or_else(|| AppError::required(field))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort).with_detail("field", field));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "{field} is too long (max {MAX_PASSWORD_LEN})"
        )));
    }
    Ok(password.to_string())
}

fn validate_profile(
    first_name: &Option<String>,
    last_name: &Option<String>,
    phone_number: &Option<String>,
) -> Result<(), AppError> {
    validate_optional_text(first_name, "first_name", MAX_NAME_LEN)?;
    validate_optional_text(last_name, "last_name", MAX_NAME_LEN)?;
    validate_optional_text(phone_number, "phone_number", MAX_SHORT_TEXT_LEN)?;
    Ok(())
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Sign up; new accounts are never admins
pub async fn create_user(
    State(state): State<ServerState>,
    Json(req): Json<UserCreate>,
) -> ApiResult<User> {
    let email = require_email(req.email.as_deref(), "email")?;
    let password = validate_new_password(req.password.as_deref(), "password")?;
    validate_profile(&req.first_name, &req.last_name, &req.phone_number)?;

    if user::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
    }

    let account = NewUser {
        email: email.clone(),
        password_hash: hash(&password)?,
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
    };
    user::create(&state.pool, account).await.map_err(|e| match e {
        // lost a race with a concurrent signup
        RepoError::Constraint(_) => AppError::new(ErrorCode::EmailAlreadyRegistered),
        other => other.into(),
    })?;

    let created = user::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::ConsistencyError, "created user vanished"))?;
    Ok(ok(created))
}

/// Partial profile update; only admins may grant or revoke admin
pub async fn update_user(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<UserUpdate>,
) -> ApiResult<User> {
    let email = match req.email.as_deref() {
        Some(email) => require_email(Some(email), "email")?,
        None => current.email.clone(),
    };
    current.require_access(&email)?;
    if req.is_admin.is_some() {
        current.require_admin()?;
    }
    validate_profile(&req.first_name, &req.last_name, &req.phone_number)?;

    let changes = ProfileChanges {
        first_name: req.first_name,
        last_name: req.last_name,
        phone_number: req.phone_number,
        is_admin: req.is_admin,
    };
    user::update_profile(&state.pool, &email, changes)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound))?;

    let updated = user::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    tracing::info!(email = %email, by = %current.email, "User profile updated");
    Ok(ok(updated))
}

/// Replace the password after checking the current one
pub async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<ChangePassword>,
) -> ApiResult<()> {
    let email = match req.email.as_deref() {
        Some(email) => require_email(Some(email), "email")?,
        None => current.email.clone(),
    };
    current.require_access(&email)?;

    let current_password = req
        .current_password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::required("current_password"))?;
    let new_password = validate_new_password(req.new_password.as_deref(), "new_password")?;

    let account = user::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;

    if !verify_password(&current_password, &account.password) {
        tracing::warn!(email = %email, "Password change rejected - current password mismatch");
        return Err(AppError::new(ErrorCode::CurrentPasswordIncorrect));
    }

    user::set_password(&state.pool, &email, &hash(&new_password)?)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound))?;
    Ok(ok(()))
}
