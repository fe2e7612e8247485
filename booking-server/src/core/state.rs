use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::payment::{PayPalClient, PaymentGateway};
use crate::storage::ImageStore;
use shared::error::AppError;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared server state, cloned into every handler
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub images: ImageStore,
}

impl ServerState {
    pub fn new(config: Config, pool: SqlitePool, gateway: Arc<dyn PaymentGateway>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let images = ImageStore::new(config.upload_dir.clone());
        Self {
            config: Arc::new(config),
            pool,
            jwt_service,
            gateway,
            images,
        }
    }

    /// Open the database, prepare directories and build the PayPal client
    pub async fn initialize(config: Config) -> Result<Self, AppError> {
        for dir in [&config.upload_dir, &config.backup_dir] {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::internal(format!("Failed to create {}: {e}", dir.display()))
            })?;
        }

        let db = DbService::new(&config.database_path).await?;
        let gateway = PayPalClient::new(config.paypal.clone())
            .map_err(|e| AppError::internal(format!("Failed to build payment client: {e}")))?;

        Ok(Self::new(config, db.pool, Arc::new(gateway)))
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
