//! Read Query Handlers
//!
//! Clients name an operation from the catalogue; the server owns the SQL.

use axum::{Json, extract::State};
use serde_json::Value as JsonValue;
use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::Record;
use crate::db::query::{self, NamedQuery};
use crate::utils::ok;
use crate::utils::validation::{MAX_SEARCH_LEN, validate_optional_text};

/// Only operations from the [`NamedQuery`] catalogue are accepted
pub async fn fetch_query(
    State(state): State<ServerState>,
    user: Option<CurrentUser>,
    Json(body): Json<JsonValue>,
) -> ApiResult<Vec<Record>> {
    let named: NamedQuery = serde_json::from_value(body).map_err(|e| {
        AppError::invalid_request(format!("Unknown operation or bad parameters: {e}"))
    })?;

    validate_params(&named)?;
    authorize(&named, user.as_ref())?;

    let rows = query::run(&state.pool, &named).await?;
    tracing::debug!(operation = named.name(), rows = rows.len(), "Query served");

    if rows.is_empty() {
        return Err(AppError::new(ErrorCode::NoData));
    }
    Ok(ok(rows))
}

fn validate_params(named: &NamedQuery) -> Result<(), AppError> {
    if let NamedQuery::PackagesWithLocation { search, .. } = named {
        validate_optional_text(search, "search", MAX_SEARCH_LEN)?;
    }
    Ok(())
}

fn authorize(named: &NamedQuery, user: Option<&CurrentUser>) -> Result<(), AppError> {
    let needs_user = named.requires_admin() || named.owner_email().is_some();
    if !needs_user {
        return Ok(());
    }
    let user = user.ok_or_else(AppError::not_authenticated)?;

    if named.requires_admin() {
        user.require_admin()?;
    }
    if let Some(owner) = named.owner_email() {
        user.require_access(&shared::util::normalize_email(owner))?;
    }
    Ok(())
}
