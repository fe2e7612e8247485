//! Booking Server - travel package booking and payment backend
//!
//! # Modules
//!
//! - **Database** (`db`): SQLite pool, generic upsert, schema-aware reads,
//!   JSON backup/restore and typed repositories
//! - **Auth** (`auth`): JWT bearer tokens and argon2 password hashes
//! - **Payment** (`payment`): gateway trait and the PayPal REST client
//! - **HTTP API** (`api`): routes and handlers
//!
//! ```text
//! booking-server/src/
//! ├── core/      # config, shared state, server
//! ├── auth/      # JWT, extractor, passwords
//! ├── db/        # pool, upsert, read path, backup, repositories
//! ├── payment/   # gateway trait, PayPal client
//! ├── api/       # HTTP routes and handlers
//! ├── utils/     # logging, validation
//! ├── money.rs   # decimal amounts
//! └── storage.rs # uploaded image files
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod money;
pub mod payment;
pub mod storage;
pub mod utils;

pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::logger::init_logger;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};
