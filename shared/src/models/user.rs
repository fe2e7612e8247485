//! User Model

use serde::{Deserialize, Serialize};

/// User entity, keyed by email
///
/// `password` holds an argon2 PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

/// Signup payload
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// Profile update payload
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub is_admin: Option<bool>,
}

/// Password change payload
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Issued bearer token and who it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub is_admin: bool,
    /// Token lifetime in seconds
    pub expires_in: i64,
}
