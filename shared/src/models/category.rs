//! Category Model

use serde::{Deserialize, Serialize};

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub category_id: i64,
    pub name: String,
    pub image_path: Option<String>,
}

/// Package-category link (junction table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PackageCategory {
    pub package_id: i64,
    pub category_id: i64,
}

/// Result of syncing a package's category links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySync {
    pub added: Vec<i64>,
    pub removed: Vec<i64>,
    /// Requested names with no matching category
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<String>,
}
