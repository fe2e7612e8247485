//! Repository Module
//!
//! Typed operations per aggregate. Each function takes the pool (or an open
//! transaction) and returns [`RepoResult`](super::RepoResult); multi-step
//! writes run inside a single transaction.

// Accounts
pub mod user;

// Catalog
pub mod category;
pub mod image;
pub mod location;
pub mod package;

// Cart and orders
pub mod booking;
pub mod order;
