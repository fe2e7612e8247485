//! JSON backup and restore
//!
//! A backup is one table dumped as a pretty-printed JSON array of row
//! objects, written to `"{table} backup - {dd-mm-YYYY_HH-MM}.json"` in the
//! backup directory. Restore reads such a file back and upserts every row in
//! a single transaction, so a bad row leaves the table untouched.

use super::query::fetch_rows;
use super::record::Record;
use super::upsert::upsert_in;
use super::{RepoError, RepoResult, Table};
use chrono::{DateTime, Local};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

const NAME_SEPARATOR: &str = " backup - ";

/// Backup file listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupFile {
    pub file_name: String,
    pub table: Option<Table>,
    pub size: u64,
}

/// Result of a restore
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestoreSummary {
    pub table: Table,
    pub rows: usize,
    pub inserted: usize,
    pub updated: usize,
}

pub fn backup_file_name(table: Table, at: DateTime<Local>) -> String {
    format!(
        "{}{NAME_SEPARATOR}{}.json",
        table.as_str(),
        at.format("%d-%m-%Y_%H-%M")
    )
}

/// Table a backup file belongs to, from its name
pub fn table_of(file_name: &str) -> Option<Table> {
    let (table, _) = file_name.split_once(NAME_SEPARATOR)?;
    table.parse().ok()
}

/// Dump `table` into `dir`; an empty table writes nothing and returns `None`
pub async fn backup_table(pool: &SqlitePool, dir: &Path, table: Table) -> RepoResult<Option<PathBuf>> {
    let rows = {
        let mut conn = pool.acquire().await?;
        fetch_rows(&mut conn, table.dump_sql(), &[], &[table]).await?
    };
    if rows.is_empty() {
        tracing::warn!(table = %table, "Table is empty, no backup written");
        return Ok(None);
    }

    let json = serde_json::to_vec_pretty(&rows).map_err(|e| RepoError::Parse(e.to_string()))?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(backup_file_name(table, Local::now()));
    tokio::fs::write(&path, json).await?;

    tracing::info!(table = %table, rows = rows.len(), path = %path.display(), "Backup written");
    Ok(Some(path))
}

/// Read the rows of a backup file; only plain file names inside `dir` are accepted
pub async fn read_backup(dir: &Path, file_name: &str) -> RepoResult<Vec<Record>> {
    let path = resolve(dir, file_name)?;
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RepoError::NotFound(format!("backup {file_name}")));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map_err(|e| RepoError::Parse(format!("{file_name} is not a row array: {e}")))
}

/// Upsert `rows` into `table` atomically
pub async fn restore_table(
    pool: &SqlitePool,
    table: Table,
    rows: Vec<Record>,
) -> RepoResult<RestoreSummary> {
    let total = rows.len();
    let mut inserted = 0;

    let mut tx = pool.begin().await?;
    for (index, row) in rows.into_iter().enumerate() {
        let outcome = upsert_in(&mut tx, table, row).await.map_err(|e| {
            tracing::warn!(table = %table, row = index, error = %e, "Restore aborted");
            e
        })?;
        if outcome.inserted {
            inserted += 1;
        }
    }
    tx.commit().await?;

    tracing::info!(table = %table, rows = total, inserted, "Table restored");
    Ok(RestoreSummary {
        table,
        rows: total,
        inserted,
        updated: total - inserted,
    })
}

/// Restore from a backup file, inferring the table from the file name
pub async fn restore_from_file(
    pool: &SqlitePool,
    dir: &Path,
    file_name: &str,
) -> RepoResult<RestoreSummary> {
    let table = table_of(file_name).ok_or_else(|| {
        RepoError::Validation(format!("{file_name} is not named after a known table"))
    })?;
    let rows = read_backup(dir, file_name).await?;
    restore_table(pool, table, rows).await
}

/// Backup files in `dir`, newest name first; a missing directory lists nothing
pub async fn list_backups(dir: &Path) -> RepoResult<Vec<BackupFile>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.ends_with(".json") {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        files.push(BackupFile {
            table: table_of(&file_name),
            file_name,
            size: metadata.len(),
        });
    }
    files.sort_by(|a, b| b.file_name.cmp(&a.file_name));
    Ok(files)
}

fn resolve(dir: &Path, file_name: &str) -> RepoResult<PathBuf> {
    if file_name.is_empty()
        || file_name.contains(['/', '\\'])
        || file_name.contains("..")
        || !file_name.ends_with(".json")
    {
        return Err(RepoError::Validation(format!(
            "invalid backup file name: {file_name}"
        )));
    }
    Ok(dir.join(file_name))
}
