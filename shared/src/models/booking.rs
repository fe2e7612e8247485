//! Booking Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking lifecycle
///
/// `InCart -> Pending -> Confirmed` or `InCart -> Pending -> Cancelled`.
/// `Confirmed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    InCart,
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::InCart => "in-cart",
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal step.
    ///
    /// Staying in the same status is always allowed; it is an edit, not a transition.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        *self == next
            || matches!(
                (self, next),
                (InCart, Pending) | (Pending, Confirmed) | (Pending, Cancelled)
            )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-cart" => Ok(BookingStatus::InCart),
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Booking {
    pub booking_id: i64,
    pub email: String,
    pub package_id: i64,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,
    pub number_of_travellers: i64,
    pub price: f64,
    pub status: BookingStatus,
}

/// Create-or-update payload; no `booking_id` means a new cart entry
#[derive(Debug, Clone, Deserialize)]
pub struct BookingUpsert {
    pub booking_id: Option<i64>,
    pub email: Option<String>,
    pub package_id: Option<i64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub number_of_travellers: Option<i64>,
    pub price: Option<f64>,
    pub status: Option<BookingStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_path() {
        assert!(BookingStatus::InCart.can_transition_to(BookingStatus::Pending));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Pending.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!BookingStatus::InCart.can_transition_to(BookingStatus::Confirmed));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::InCart));
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert!(BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&BookingStatus::InCart).unwrap(),
            "\"in-cart\""
        );
        let status: BookingStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, BookingStatus::Cancelled);
        assert_eq!("pending".parse::<BookingStatus>(), Ok(BookingStatus::Pending));
        assert!("paid".parse::<BookingStatus>().is_err());
    }
}
