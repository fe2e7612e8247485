//! Backup Handlers
//!
//! Admin-only JSON dumps of single tables and transactional restore.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::api::convert::not_found_as;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::Table;
use crate::db::backup::{self, BackupFile, RestoreSummary};
use crate::utils::ok;

#[derive(Debug, Serialize)]
pub struct BackupWritten {
    pub table: Table,
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequest {
    pub file_name: String,
}

fn parse_table(name: &str) -> Result<Table, AppError> {
    name.parse()
        .map_err(|_| AppError::with_message(ErrorCode::UnknownTable, format!("Unknown table: {name}")))
}

/// Dump one table to a timestamped JSON file
pub async fn backup(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(table): Path<String>,
) -> ApiResult<BackupWritten> {
    current.require_admin()?;
    let table = parse_table(&table)?;

    let path = backup::backup_table(&state.pool, &state.config.backup_dir, table)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BackupTableEmpty).with_detail("table", table.as_str()))?;
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::info!(table = %table, file = %file_name, by = %current.email, "Backup requested");
    Ok(ok(BackupWritten { table, file_name }))
}

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> ApiResult<Vec<BackupFile>> {
    current.require_admin()?;
    let files = backup::list_backups(&state.config.backup_dir).await?;
    Ok(ok(files))
}

/// Upsert every row of a backup file back into its table, all or nothing
pub async fn restore(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(req): Json<RestoreRequest>,
) -> ApiResult<RestoreSummary> {
    current.require_admin()?;
    let summary = backup::restore_from_file(&state.pool, &state.config.backup_dir, &req.file_name)
        .await
        .map_err(not_found_as(ErrorCode::BackupNotFound))?;

    tracing::info!(
        table = %summary.table,
        rows = summary.rows,
        file = %req.file_name,
        by = %current.email,
        "Restore completed"
    );
    Ok(ok(summary))
}
