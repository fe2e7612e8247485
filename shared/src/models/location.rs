//! Location Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Location {
    pub location_id: i64,
    pub country: String,
    pub city: String,
    pub image_path: Option<String>,
}
