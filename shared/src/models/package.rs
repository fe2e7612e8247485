//! Package Model

use serde::{Deserialize, Serialize};

/// Travel package entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Package {
    pub package_id: i64,
    pub location_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// Length of the trip in days
    pub duration: i64,
    pub price: f64,
}

/// Package identifier as sent by the admin panel: a number, a numeric
/// string, or the literal `"new"` for a package that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageKey {
    Id(i64),
    Label(String),
}

impl PackageKey {
    /// Existing package id, `None` for a new package.
    ///
    /// Returns `Err` with the offending label when it is neither `"new"` nor a number.
    pub fn existing(&self) -> Result<Option<i64>, String> {
        match self {
            PackageKey::Id(id) => Ok(Some(*id)),
            PackageKey::Label(label) => {
                let label = label.trim();
                if label.is_empty() || label.eq_ignore_ascii_case("new") {
                    Ok(None)
                } else {
                    label.parse().map(Some).map_err(|_| label.to_string())
                }
            }
        }
    }
}

/// Create-or-update payload
#[derive(Debug, Clone, Deserialize)]
pub struct PackageUpsert {
    #[serde(default)]
    pub package_id: Option<PackageKey>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location_id: Option<i64>,
    pub duration: Option<i64>,
    pub price: Option<f64>,
    /// Category names; the package ends up linked to exactly these.
    /// Absent leaves the current links alone.
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// Delete payload
#[derive(Debug, Clone, Deserialize)]
pub struct PackageDelete {
    pub package_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_key_existing() {
        assert_eq!(PackageKey::Id(4).existing(), Ok(Some(4)));
        assert_eq!(PackageKey::Label("new".into()).existing(), Ok(None));
        assert_eq!(PackageKey::Label("12".into()).existing(), Ok(Some(12)));
        assert_eq!(
            PackageKey::Label("abc".into()).existing(),
            Err("abc".to_string())
        );
    }

    #[test]
    fn test_package_key_deserialize() {
        let key: PackageKey = serde_json::from_str("5").unwrap();
        assert_eq!(key, PackageKey::Id(5));
        let key: PackageKey = serde_json::from_str("\"new\"").unwrap();
        assert_eq!(key, PackageKey::Label("new".into()));
    }
}
