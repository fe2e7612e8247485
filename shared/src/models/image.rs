//! Package Image Model

use serde::{Deserialize, Serialize};

/// Image row; `image_path` is relative to the upload root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PackageImage {
    pub image_id: i64,
    pub package_id: i64,
    pub image_path: String,
}

/// Upload response entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    pub image_id: i64,
    pub image_path: String,
    pub url: String,
}

/// Bulk delete payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteImages {
    #[serde(default)]
    pub image_ids: Vec<i64>,
}
