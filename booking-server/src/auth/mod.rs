//! Authentication
//!
//! - [`JwtService`] issues and validates bearer tokens
//! - [`CurrentUser`] is the authenticated caller, available as an extractor
//! - [`password`] hashes and verifies account passwords

pub mod extractor;
pub mod jwt;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
