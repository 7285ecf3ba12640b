use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, PgProfileStore};
use crate::services::library::{Library, LibraryHandle};
use crate::services::profile::ProfileService;
use crate::services::providers::firebase_storage::FirebaseStorage;
use crate::services::providers::identity_toolkit::IdentityToolkitProvider;
use crate::services::providers::local::{
    achievement_catalog, LocalIdentity, LocalImageStore, LocalProfileStore,
};
use crate::services::providers::{IdentityProvider, ImageStore, ProfileStore};
use crate::services::session::SessionGate;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub library: LibraryHandle,
    pub session: Arc<SessionGate>,
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: ProfileService,
}

impl AppState {
    /// Wires the state around the given providers and subscribes the session gate
    pub fn new(
        library: Library,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn ProfileStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let session = Arc::new(SessionGate::new(identity.as_ref()));
        let profiles = ProfileService::new(store, images, identity.clone());

        Self {
            library: library.into_handle(),
            session,
            identity,
            profiles,
        }
    }

    /// State backed entirely by in-process providers
    pub fn local(config: &Config) -> Self {
        Self::new(
            Library::with_history_capacity(config.recently_viewed_capacity),
            Arc::new(LocalIdentity::new()),
            Arc::new(LocalProfileStore::with_achievements(achievement_catalog())),
            Arc::new(LocalImageStore::new(config.local_storage_url.clone())),
        )
    }

    /// Builds the state selected by the configuration
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let api_key = match (&config.firebase_api_key, config.is_local_backend()) {
            (Some(key), false) => key.clone(),
            _ => {
                tracing::warn!("Using local in-memory backend");
                return Ok(Self::local(config));
            }
        };

        let pool = create_pool(&config.database_url).await?;
        let identity = IdentityToolkitProvider::new(
            api_key,
            config.identity_api_url.clone(),
            config.oauth_request_uri.clone(),
        );
        let images = FirebaseStorage::new(
            config.storage_api_url.clone(),
            config.storage_bucket.clone(),
        );

        tracing::info!(bucket = %config.storage_bucket, "Using remote backend");

        Ok(Self::new(
            Library::with_history_capacity(config.recently_viewed_capacity),
            Arc::new(identity),
            Arc::new(PgProfileStore::new(pool)),
            Arc::new(images),
        ))
    }
}
