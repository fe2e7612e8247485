//! JWT Extractor
//!
//! `CurrentUser` as a handler argument requires a valid bearer token;
//! `Option<CurrentUser>` accepts anonymous callers but still rejects a bad token.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use shared::error::AppError;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;

fn authenticate(parts: &mut Parts, state: &ServerState, header: &str) -> Result<CurrentUser, AppError> {
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?;

    match state.get_jwt_service().validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            parts.extensions.insert(user.clone());
            Ok(user)
        }
        Err(e) => {
            tracing::warn!(error = %e, uri = %parts.uri, "Token rejected");
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

fn authorization_header(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        match authorization_header(parts) {
            Some(header) => authenticate(parts, state, &header),
            None => {
                tracing::debug!(uri = %parts.uri, "Missing authorization header");
                Err(AppError::not_authenticated())
            }
        }
    }
}

impl OptionalFromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Some(user.clone()));
        }

        match authorization_header(parts) {
            Some(header) => authenticate(parts, state, &header).map(Some),
            None => Ok(None),
        }
    }
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::admin_required())
        }
    }

    /// Own account, or any account for admins
    pub fn require_access(&self, email: &str) -> Result<(), AppError> {
        if self.can_access(email) {
            Ok(())
        } else {
            Err(AppError::permission_denied("Not allowed to act on another account"))
        }
    }
}
