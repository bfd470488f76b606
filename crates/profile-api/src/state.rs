//! Application state

use crate::auth::{IdentityProvider, JwtIdentityProvider};
use crate::codes;
use crate::config::ServiceConfig;
use crate::store::{MemoryUserStore, MySqlUserStore, UserStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared services, constructed once at process start and handed to the
/// request pipeline. Nothing in here is mutated per request.
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Arc<dyn UserStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Wire up the production collaborators from configuration
    pub async fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        // Fail fast if the packaged code table is broken.
        let _ = codes::table();

        let store: Arc<dyn UserStore> = if config.memory_store {
            warn!("using in-memory user store - data will NOT persist");
            Arc::new(MemoryUserStore::new())
        } else {
            let store = MySqlUserStore::connect(&config.database).await?;
            info!(
                host = %config.database.host,
                database = %config.database.name,
                "connected to MySQL"
            );
            Arc::new(store)
        };

        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?;
        let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(secret));

        Ok(Self {
            config,
            store,
            identity,
        })
    }
}
