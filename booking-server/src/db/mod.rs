//! Database Module
//!
//! Handles the SQLite connection pool, migrations and the table allow-list
//! shared by the upsert engine, the read path and backups.

pub mod backup;
pub mod query;
pub mod record;
pub mod repository;
pub mod schema;
pub mod upsert;

pub use record::{Record, Value};
pub use upsert::{UpsertOutcome, upsert, upsert_in};

use serde::{Deserialize, Serialize};
use shared::error::AppError;
use sqlx::SqlitePool;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Database service, owns a SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the database file with WAL and foreign keys, then migrate
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        // Writers wait instead of failing immediately on a locked database
        sqlx::query("PRAGMA busy_timeout = 5000;")
            .execute(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

        tracing::info!(path = %db_path, "Database connection established (SQLite WAL)");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A uniqueness, foreign key, not-null or check constraint rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The write is legal SQL but not allowed in the record's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A multi-step write found the data different from what it just checked
    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    return RepoError::Constraint(db_err.message().to_string());
                }
                _ => {}
            }
        }
        RepoError::Database(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Tables reachable through the generic data paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    Users,
    Locations,
    Categories,
    Packages,
    PackageCategory,
    PackageImages,
    Bookings,
    Orders,
    OrderItems,
}

impl Table {
    pub const ALL: [Table; 9] = [
        Table::Users,
        Table::Locations,
        Table::Categories,
        Table::Packages,
        Table::PackageCategory,
        Table::PackageImages,
        Table::Bookings,
        Table::Orders,
        Table::OrderItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "Users",
            Table::Locations => "Locations",
            Table::Categories => "Categories",
            Table::Packages => "Packages",
            Table::PackageCategory => "PackageCategory",
            Table::PackageImages => "PackageImages",
            Table::Bookings => "Bookings",
            Table::Orders => "Orders",
            Table::OrderItems => "OrderItems",
        }
    }

    /// Full dump in key order, credentials included (backups only)
    pub(crate) fn dump_sql(&self) -> &'static str {
        match self {
            Table::Users => "SELECT * FROM Users ORDER BY email",
            Table::Locations => "SELECT * FROM Locations ORDER BY location_id",
            Table::Categories => "SELECT * FROM Categories ORDER BY category_id",
            Table::Packages => "SELECT * FROM Packages ORDER BY package_id",
            Table::PackageCategory => {
                "SELECT * FROM PackageCategory ORDER BY package_id, category_id"
            }
            Table::PackageImages => "SELECT * FROM PackageImages ORDER BY image_id",
            Table::Bookings => "SELECT * FROM Bookings ORDER BY booking_id",
            Table::Orders => "SELECT * FROM Orders ORDER BY order_id",
            Table::OrderItems => "SELECT * FROM OrderItems ORDER BY order_id, booking_id",
        }
    }

    /// Client-facing listing; never exposes password hashes
    pub(crate) fn list_sql(&self) -> &'static str {
        match self {
            Table::Users => {
                "SELECT email, phone_number, first_name, last_name, is_admin FROM Users ORDER BY email"
            }
            other => other.dump_sql(),
        }
    }

    /// Catalog tables anyone may list; the rest hold personal or order data
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Table::Locations
                | Table::Categories
                | Table::Packages
                | Table::PackageCategory
                | Table::PackageImages
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RepoError::Validation(format!("unknown table: {s}")))
    }
}

/// Migrated in-memory database for tests
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    // One connection: every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}
