//! Unified error codes for the booking backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: User errors
//! - 4xxx: Booking and order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog and upload errors
//! - 7xxx: Backup errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch
/// on a number instead of parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Write rejected by a uniqueness or reference constraint
    ConstraintViolation = 9,
    /// Query matched no rows
    NoData = 10,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Current password did not match on password change
    CurrentPasswordIncorrect = 1005,
    /// New password is too short
    PasswordTooShort = 1006,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Administrator role is required
    AdminRequired = 2003,

    // ==================== 3xxx: User ====================
    /// User not found
    UserNotFound = 3001,
    /// Email already registered
    EmailAlreadyRegistered = 3002,

    // ==================== 4xxx: Booking / Order ====================
    /// Booking not found
    BookingNotFound = 4001,
    /// Booking status change is not allowed
    BookingInvalidTransition = 4002,
    /// Booking is not in the cart
    BookingNotInCart = 4003,
    /// Order not found
    OrderNotFound = 4101,
    /// Cart is empty
    CartEmpty = 4102,
    /// Order total is missing or not positive
    InvalidOrderTotal = 4103,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Payment gateway could not be reached
    GatewayUnavailable = 5002,
    /// Payment gateway rejected the request
    GatewayRejected = 5003,

    // ==================== 6xxx: Catalog ====================
    /// Package not found
    PackageNotFound = 6001,
    /// Location not found
    LocationNotFound = 6002,
    /// Package is still referenced by bookings
    PackageHasBookings = 6003,
    /// Category not found
    CategoryNotFound = 6101,
    /// Image not found
    ImageNotFound = 6201,

    // ==================== 65xx: File Upload ====================
    /// File too large
    FileTooLarge = 6501,
    /// Unsupported file format
    UnsupportedFileFormat = 6502,
    /// No file provided in request
    NoFileProvided = 6504,
    /// Empty file provided
    EmptyFile = 6505,
    /// No filename provided
    NoFilename = 6506,
    /// File storage failed
    FileStorageFailed = 6509,

    // ==================== 7xxx: Backup ====================
    /// Backup file not found
    BackupNotFound = 7001,
    /// Backup file could not be parsed
    BackupMalformed = 7002,
    /// Table has no rows to back up
    BackupTableEmpty = 7003,
    /// Table is not known to the backup service
    UnknownTable = 7004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Table metadata lookup failed
    SchemaError = 9006,
    /// Multi-step operation left inconsistent state
    ConsistencyError = 9007,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::ConstraintViolation => "Request conflicts with existing data",
            ErrorCode::NoData => "No data",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::CurrentPasswordIncorrect => "Current password is incorrect",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Administrator role is required",

            // User
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",

            // Booking / Order
            ErrorCode::BookingNotFound => "Booking not found",
            ErrorCode::BookingInvalidTransition => "Booking status change is not allowed",
            ErrorCode::BookingNotInCart => "Booking is not in the cart",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::InvalidOrderTotal => "Order total must be greater than zero",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::GatewayUnavailable => "Payment gateway is unavailable",
            ErrorCode::GatewayRejected => "Payment gateway rejected the request",

            // Catalog
            ErrorCode::PackageNotFound => "Package not found",
            ErrorCode::LocationNotFound => "Location not found",
            ErrorCode::PackageHasBookings => "Package has associated bookings",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::ImageNotFound => "Image not found",

            // File Upload
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::NoFilename => "No filename provided",
            ErrorCode::FileStorageFailed => "File storage failed",

            // Backup
            ErrorCode::BackupNotFound => "Backup file not found",
            ErrorCode::BackupMalformed => "Backup file is malformed",
            ErrorCode::BackupTableEmpty => "Table is empty, nothing to back up",
            ErrorCode::UnknownTable => "Unknown table",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::SchemaError => "Schema lookup failed",
            ErrorCode::ConsistencyError => "Operation could not be completed consistently",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::ConstraintViolation),
            10 => Ok(ErrorCode::NoData),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::CurrentPasswordIncorrect),
            1006 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),

            // User
            3001 => Ok(ErrorCode::UserNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyRegistered),

            // Booking / Order
            4001 => Ok(ErrorCode::BookingNotFound),
            4002 => Ok(ErrorCode::BookingInvalidTransition),
            4003 => Ok(ErrorCode::BookingNotInCart),
            4101 => Ok(ErrorCode::OrderNotFound),
            4102 => Ok(ErrorCode::CartEmpty),
            4103 => Ok(ErrorCode::InvalidOrderTotal),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::GatewayUnavailable),
            5003 => Ok(ErrorCode::GatewayRejected),

            // Catalog
            6001 => Ok(ErrorCode::PackageNotFound),
            6002 => Ok(ErrorCode::LocationNotFound),
            6003 => Ok(ErrorCode::PackageHasBookings),
            6101 => Ok(ErrorCode::CategoryNotFound),
            6201 => Ok(ErrorCode::ImageNotFound),

            // File Upload
            6501 => Ok(ErrorCode::FileTooLarge),
            6502 => Ok(ErrorCode::UnsupportedFileFormat),
            6504 => Ok(ErrorCode::NoFileProvided),
            6505 => Ok(ErrorCode::EmptyFile),
            6506 => Ok(ErrorCode::NoFilename),
            6509 => Ok(ErrorCode::FileStorageFailed),

            // Backup
            7001 => Ok(ErrorCode::BackupNotFound),
            7002 => Ok(ErrorCode::BackupMalformed),
            7003 => Ok(ErrorCode::BackupTableEmpty),
            7004 => Ok(ErrorCode::UnknownTable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9006 => Ok(ErrorCode::SchemaError),
            9007 => Ok(ErrorCode::ConsistencyError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
