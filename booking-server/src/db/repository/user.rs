//! User Repository
//!
//! Emails arrive normalized (trimmed, lowercase); passwords arrive hashed.

use crate::db::{Record, RepoError, RepoResult, Table, upsert_in};
use shared::models::User;
use sqlx::SqlitePool;

/// New account, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Profile fields to change; `None` leaves the stored value alone
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_admin: Option<bool>,
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT email, password, phone_number, first_name, last_name, is_admin \
         FROM Users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Insert a non-admin account; an existing email is a constraint violation
pub async fn create(pool: &SqlitePool, user: NewUser) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO Users (email, password, first_name, last_name, phone_number, is_admin) \
         VALUES (?, ?, ?, ?, ?, 0)",
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.phone_number)
    .execute(pool)
    .await?;
    tracing::info!(email = %user.email, "User created");
    Ok(())
}

/// Partial profile update of an existing account
pub async fn update_profile(
    pool: &SqlitePool,
    email: &str,
    changes: ProfileChanges,
) -> RepoResult<()> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM Users WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(RepoError::NotFound(format!("user {email}")));
    }

    let record = Record::new()
        .with("email", email)
        .with_opt("first_name", changes.first_name)
        .with_opt("last_name", changes.last_name)
        .with_opt("phone_number", changes.phone_number)
        .with_opt("is_admin", changes.is_admin);
    upsert_in(&mut tx, Table::Users, record).await?;

    tx.commit().await?;
    Ok(())
}

pub async fn set_password(pool: &SqlitePool, email: &str, password_hash: &str) -> RepoResult<()> {
    let result = sqlx::query("UPDATE Users SET password = ? WHERE email = ?")
        .bind(password_hash)
        .bind(email)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("user {email}")));
    }
    tracing::info!(email = %email, "Password changed");
    Ok(())
}
