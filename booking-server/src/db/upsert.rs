//! Generic UPSERT
//!
//! Writes one [`Record`] into any allow-listed table:
//!
//! 1. Every column must exist in the table.
//! 2. The first column is the key. The conflict target is that column when it
//!    is the sole primary key or carries a unique index, otherwise the full
//!    primary key (all of whose columns must then be present).
//! 3. A null key is accepted only for an `INTEGER PRIMARY KEY`; SQLite assigns it.
//! 4. Protected columns (`password`) sent empty are treated as absent.
//! 5. The insert tuple is completed from the existing row's NOT NULL columns
//!    when there is one, otherwise from literal column defaults. Only the
//!    columns the caller sent appear in `DO UPDATE SET`, so a partial update
//!    never touches the rest.

use super::record::{Record, Value, bind_value, row_to_record};
use super::schema::{TableSchema, table_schema};
use super::{RepoError, RepoResult, Table};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

/// Columns an update must never blank out
const PROTECTED_COLUMNS: &[&str] = &["password"];

/// Result of one upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertOutcome {
    /// Value of the key column (the generated id for new rowid rows)
    pub key: Value,
    pub inserted: bool,
}

impl UpsertOutcome {
    pub fn id(&self) -> Option<i64> {
        self.key.as_i64()
    }
}

/// Upsert in its own transaction
pub async fn upsert(pool: &SqlitePool, table: Table, record: Record) -> RepoResult<UpsertOutcome> {
    let mut tx = pool.begin().await?;
    let outcome = upsert_in(&mut tx, table, record).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Upsert on a caller-owned connection or transaction
pub async fn upsert_in(
    conn: &mut SqliteConnection,
    table: Table,
    mut record: Record,
) -> RepoResult<UpsertOutcome> {
    let schema = table_schema(conn, table).await?;
    validate_columns(&schema, &record)?;
    let conflict = conflict_target(&schema, &record)?;

    let key_is_null = conflict
        .iter()
        .any(|c| record.get(c).is_none_or(Value::is_null));
    let generated = if key_is_null {
        match schema.rowid_alias() {
            Some(alias) if conflict == [alias.name.as_str()] => {
                record.remove(&alias.name);
                true
            }
            _ => {
                return Err(RepoError::Validation(format!(
                    "{} is required",
                    conflict.join(", ")
                )));
            }
        }
    } else {
        false
    };

    for column in PROTECTED_COLUMNS {
        if record.get(column).is_some_and(Value::is_blank) {
            record.remove(column);
        }
    }

    let existing = if generated {
        None
    } else {
        find_existing(conn, &schema, &conflict, &record).await?
    };

    let update_columns: Vec<String> = record
        .columns()
        .filter(|c| !conflict.contains(c))
        .map(str::to_string)
        .collect();

    let mut insert = record.clone();
    match &existing {
        Some(row) => {
            // The insert tuple must pass NOT NULL checks before the conflict resolves
            for column in schema.columns.iter().filter(|c| c.is_not_null()) {
                if !insert.contains(&column.name)
                    && let Some(value) = row.get(&column.name)
                {
                    insert.insert(column.name.clone(), value.clone());
                }
            }
        }
        None => {
            for column in &schema.columns {
                if !insert.contains(&column.name)
                    && !(generated && column.pk > 0)
                    && let Some(default) = column.literal_default()
                {
                    insert.insert(column.name.clone(), default);
                }
            }
        }
    }
    if insert.is_empty() {
        return Err(RepoError::Validation("nothing to write".into()));
    }

    let insert_columns: Vec<&str> = insert.columns().collect();
    let sql = build_upsert_sql(table.as_str(), &insert_columns, &conflict, &update_columns);

    let mut query = sqlx::query(&sql);
    for (_, value) in insert.iter() {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut *conn).await?;

    let key = if generated {
        Value::Integer(result.last_insert_rowid())
    } else {
        record
            .first()
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Null)
    };

    tracing::debug!(
        table = %table,
        key = ?key,
        inserted = existing.is_none(),
        "Upserted record"
    );

    Ok(UpsertOutcome {
        key,
        inserted: existing.is_none(),
    })
}

fn validate_columns(schema: &TableSchema, record: &Record) -> RepoResult<()> {
    if record.is_empty() {
        return Err(RepoError::Validation("record has no columns".into()));
    }
    if let Some(unknown) = record.columns().find(|c| !schema.has_column(c)) {
        return Err(RepoError::Validation(format!(
            "unknown column {unknown} for table {}",
            schema.table
        )));
    }
    Ok(())
}

/// Columns of the `ON CONFLICT` clause, derived from the record's first column
fn conflict_target<'a>(schema: &'a TableSchema, record: &Record) -> RepoResult<Vec<&'a str>> {
    let (first, _) = record
        .first()
        .ok_or_else(|| RepoError::Validation("record has no columns".into()))?;
    let pk = schema.primary_key();

    let sole_key = pk.len() == 1 && pk[0].name == first;
    if sole_key || schema.is_unique(first) {
        let column = schema
            .column(first)
            .ok_or_else(|| RepoError::Validation(format!("unknown column {first}")))?;
        return Ok(vec![column.name.as_str()]);
    }

    if pk.len() > 1 && pk.iter().any(|c| c.name == first) {
        if let Some(missing) = pk.iter().find(|c| !record.contains(&c.name)) {
            return Err(RepoError::Validation(format!("{} is required", missing.name)));
        }
        return Ok(pk.iter().map(|c| c.name.as_str()).collect());
    }

    Err(RepoError::Schema(format!(
        "{first} is not a key of table {}",
        schema.table
    )))
}

async fn find_existing(
    conn: &mut SqliteConnection,
    schema: &TableSchema,
    conflict: &[&str],
    record: &Record,
) -> RepoResult<Option<Record>> {
    let predicate = conflict
        .iter()
        .map(|c| format!("{} = ?", quote_ident(c)))
        .collect::<Vec<_>>()
        .join(" AND ");
    let sql = format!(
        "SELECT * FROM {} WHERE {predicate}",
        quote_ident(schema.table.as_str())
    );

    let mut query = sqlx::query(&sql);
    for column in conflict {
        query = bind_value(query, record.get(column).unwrap_or(&Value::Null));
    }
    let row = query.fetch_optional(&mut *conn).await?;
    Ok(row.as_ref().map(row_to_record).transpose()?)
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `INSERT ... ON CONFLICT (...) DO UPDATE SET ...` (or `DO NOTHING`)
pub(crate) fn build_upsert_sql(
    table: &str,
    insert_columns: &[&str],
    conflict: &[&str],
    update_columns: &[String],
) -> String {
    let columns = insert_columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; insert_columns.len()].join(", ");
    let target = conflict
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    let action = if update_columns.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments = update_columns
            .iter()
            .map(|c| {
                let q = quote_ident(c);
                format!("{q} = excluded.{q}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("DO UPDATE SET {assignments}")
    };

    format!(
        "INSERT INTO {} ({columns}) VALUES ({placeholders}) ON CONFLICT ({target}) {action}",
        quote_ident(table)
    )
}
