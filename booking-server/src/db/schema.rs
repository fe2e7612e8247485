//! Table introspection
//!
//! Column metadata comes from `PRAGMA table_info` and single-column unique
//! indexes from `PRAGMA index_list` / `PRAGMA index_info`. Nothing is cached:
//! the schema is read in the same connection (and transaction) as the write
//! that depends on it.

use super::record::Value;
use super::{RepoError, RepoResult, Table};
use sqlx::{Row, SqliteConnection};
use std::collections::HashSet;

/// One row of `PRAGMA table_info`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub declared_type: String,
    #[sqlx(rename = "notnull")]
    pub not_null: i64,
    pub dflt_value: Option<String>,
    /// 1-based position in the primary key, 0 when not part of it
    pub pk: i64,
}

impl ColumnInfo {
    pub fn is_not_null(&self) -> bool {
        self.not_null != 0
    }

    /// Declared as a flag (`BOOLEAN`, `BOOL`)
    pub fn is_boolean(&self) -> bool {
        self.declared_type.to_ascii_uppercase().contains("BOOL")
    }

    /// Literal default as a value; expression defaults (`CURRENT_DATE`, `(...)`)
    /// are left to SQLite.
    pub fn literal_default(&self) -> Option<Value> {
        self.dflt_value.as_deref().and_then(parse_default)
    }
}

/// Column metadata of one table
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub table: Table,
    pub columns: Vec<ColumnInfo>,
    /// Columns carrying their own single-column unique index
    pub unique_columns: HashSet<String>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Primary key columns in key order
    pub fn primary_key(&self) -> Vec<&ColumnInfo> {
        let mut pk: Vec<&ColumnInfo> = self.columns.iter().filter(|c| c.pk > 0).collect();
        pk.sort_by_key(|c| c.pk);
        pk
    }

    /// Single `INTEGER PRIMARY KEY` column, which SQLite assigns when omitted
    pub fn rowid_alias(&self) -> Option<&ColumnInfo> {
        match self.primary_key().as_slice() {
            [only] if only.declared_type.eq_ignore_ascii_case("INTEGER") => Some(*only),
            _ => None,
        }
    }

    pub fn is_unique(&self, name: &str) -> bool {
        self.unique_columns.contains(name)
    }

    pub fn boolean_columns(&self) -> HashSet<String> {
        self.columns
            .iter()
            .filter(|c| c.is_boolean())
            .map(|c| c.name.clone())
            .collect()
    }
}

/// Read the schema of `table`; an empty column list means the table is missing
pub async fn table_schema(conn: &mut SqliteConnection, table: Table) -> RepoResult<TableSchema> {
    let name = table.as_str();
    let columns = sqlx::query_as::<_, ColumnInfo>(&format!("PRAGMA table_info(\"{name}\")"))
        .fetch_all(&mut *conn)
        .await
        .map_err(schema_error)?;
    if columns.is_empty() {
        return Err(RepoError::Schema(format!("table {name} does not exist")));
    }

    let indexes = sqlx::query(&format!("PRAGMA index_list(\"{name}\")"))
        .fetch_all(&mut *conn)
        .await
        .map_err(schema_error)?;

    let mut unique_columns = HashSet::new();
    for index in indexes {
        let unique: i64 = index.try_get("unique").map_err(schema_error)?;
        if unique == 0 {
            continue;
        }
        let index_name: String = index.try_get("name").map_err(schema_error)?;
        let parts = sqlx::query(&format!(
            "PRAGMA index_info(\"{}\")",
            index_name.replace('"', "\"\"")
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(schema_error)?;
        if let [only] = parts.as_slice() {
            let column: Option<String> = only.try_get("name").map_err(schema_error)?;
            if let Some(column) = column {
                unique_columns.insert(column);
            }
        }
    }

    Ok(TableSchema {
        table,
        columns,
        unique_columns,
    })
}

fn schema_error(err: sqlx::Error) -> RepoError {
    RepoError::Schema(format!("table metadata lookup failed: {err}"))
}

fn parse_default(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Some(Value::Text(raw[1..raw.len() - 1].replace("''", "'")));
    }
    if raw.eq_ignore_ascii_case("TRUE") {
        return Some(Value::Bool(true));
    }
    if raw.eq_ignore_ascii_case("FALSE") {
        return Some(Value::Bool(false));
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Some(Value::Real(f));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_parse_default() {
        assert_eq!(parse_default("0"), Some(Value::Integer(0)));
        assert_eq!(parse_default("'in-cart'"), Some(Value::from("in-cart")));
        assert_eq!(parse_default("'it''s'"), Some(Value::from("it's")));
        assert_eq!(parse_default("1.5"), Some(Value::Real(1.5)));
        assert_eq!(parse_default("CURRENT_DATE"), None);
        assert_eq!(parse_default("NULL"), None);
    }

    #[tokio::test]
    async fn test_users_schema() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let schema = table_schema(&mut conn, Table::Users).await.unwrap();

        let pk: Vec<&str> = schema.primary_key().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(pk, vec!["email"]);
        assert!(schema.rowid_alias().is_none());
        assert!(schema.boolean_columns().contains("is_admin"));
        assert_eq!(
            schema.column("is_admin").unwrap().literal_default(),
            Some(Value::Integer(0))
        );
        assert!(schema.column("password").unwrap().is_not_null());
    }

    #[tokio::test]
    async fn test_missing_table_is_schema_error() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        sqlx::query("DROP TABLE OrderItems")
            .execute(&mut *conn)
            .await
            .unwrap();
        assert!(matches!(
            table_schema(&mut conn, Table::OrderItems).await,
            Err(RepoError::Schema(_))
        ));
    }

    #[tokio::test]
    async fn test_composite_key_and_unique_columns() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let links = table_schema(&mut conn, Table::PackageCategory).await.unwrap();
        let pk: Vec<&str> = links.primary_key().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(pk, vec!["package_id", "category_id"]);
        assert!(links.rowid_alias().is_none());

        let categories = table_schema(&mut conn, Table::Categories).await.unwrap();
        assert_eq!(categories.rowid_alias().unwrap().name, "category_id");
        assert!(categories.is_unique("name"));
        assert!(!categories.is_unique("image_path"));
    }
}
