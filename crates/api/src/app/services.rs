//! Service wiring: store selection, seeding, and the shared service handles.

use std::sync::Arc;

use anyhow::Context;

use warden_auth::{
    AccountService, Argon2Hasher, Authenticator, CredentialHasher, IdentityStore, InMemoryIdentityStore,
    TokenCodec,
};
use warden_infra::{PostgresIdentityStore, bootstrap_super_admin, seed_roles};

use crate::config::ApiConfig;

/// Handles shared by every request.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub authenticator: Authenticator,
    pub accounts: AccountService,
}

impl AppServices {
    pub fn new(
        store: Arc<dyn IdentityStore>,
        hasher: Arc<dyn CredentialHasher>,
        codec: TokenCodec,
    ) -> anyhow::Result<Self> {
        let authenticator = Authenticator::new(store.clone(), hasher.clone(), Arc::new(codec))
            .context("preparing authenticator")?;
        Ok(Self {
            authenticator,
            accounts: AccountService::new(store, hasher),
        })
    }
}

/// Pick the store, seed roles and the bootstrap account, and build the services.
pub async fn build_services(config: &ApiConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn IdentityStore> = match &config.database_url {
        Some(url) => {
            let pg = PostgresIdentityStore::connect(url)
                .await
                .context("connecting to DATABASE_URL")?;
            pg.migrate().await.context("applying identity schema")?;
            tracing::info!("using postgres identity store");
            Arc::new(pg)
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory identity store");
            Arc::new(InMemoryIdentityStore::new())
        }
    };
    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new());

    seed_roles(store.as_ref()).await?;
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_super_admin(store.as_ref(), hasher.as_ref(), admin).await?;
    }

    let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.jwt_expiration())
        .context("building token codec")?;

    AppServices::new(store, hasher, codec)
}
