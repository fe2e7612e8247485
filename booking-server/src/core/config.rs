use crate::auth::JwtConfig;
use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | ENVIRONMENT | development | development / staging / production |
/// | DATABASE_PATH | holidaybookingsystem.db | SQLite file |
/// | HTTP_PORT | 5000 | HTTP listen port |
/// | UPLOAD_DIR | uploads | image root |
/// | BACKUP_DIR | db/backups | JSON backup directory |
/// | JWT_SECRET | (dev value) | token signing secret, required outside development |
/// | JWT_EXPIRATION_DAYS | 30 | token lifetime |
/// | PAYPAL_CLIENT_ID / PAYPAL_CLIENT_SECRET | (dev values) | gateway credentials, required outside development |
/// | PAYPAL_BASE_URL | https://api-m.sandbox.paypal.com | gateway base URL |
/// | PAYMENT_CURRENCY | AUD | currency of gateway orders |
/// | LOG_LEVEL | info | default log level |
/// | LOG_JSON | false | JSON log lines |
/// | LOG_DIR | (unset) | daily rolling log files |
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub database_path: String,
    pub http_port: u16,
    pub upload_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub jwt: JwtConfig,
    pub paypal: PayPalConfig,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub currency: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "holidaybookingsystem.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            backup_dir: std::env::var("BACKUP_DIR")
                .unwrap_or_else(|_| "db/backups".into())
                .into(),
            jwt: JwtConfig {
                secret: Self::require_secret("JWT_SECRET", &environment)?,
                expiration_days: std::env::var("JWT_EXPIRATION_DAYS")
                    .ok()
                    .and_then(|d| d.parse().ok())
                    .unwrap_or(30),
                issuer: "booking-server".into(),
            },
            paypal: PayPalConfig {
                base_url: std::env::var("PAYPAL_BASE_URL")
                    .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".into()),
                client_id: Self::require_secret("PAYPAL_CLIENT_ID", &environment)?,
                client_secret: Self::require_secret("PAYPAL_CLIENT_SECRET", &environment)?,
                currency: std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "AUD".into()),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()).map(PathBuf::from),
            environment,
        })
    }

    /// Development configuration rooted at `work_dir`, no environment lookups
    ///
    /// Used by tests
    pub fn for_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self {
            environment: "development".into(),
            database_path: work_dir.join("bookings.db").to_string_lossy().into_owned(),
            http_port: 0,
            upload_dir: work_dir.join("uploads"),
            backup_dir: work_dir.join("backups"),
            jwt: JwtConfig {
                secret: "dev-JWT_SECRET-not-for-production".into(),
                expiration_days: 30,
                issuer: "booking-server".into(),
            },
            paypal: PayPalConfig {
                base_url: "http://127.0.0.1:9".into(),
                client_id: "dev-client".into(),
                client_secret: "dev-secret".into(),
                currency: "AUD".into(),
            },
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
