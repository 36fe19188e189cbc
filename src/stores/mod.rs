pub mod auth_store;
pub mod cache;
pub mod pocket_store;
pub mod status;
pub mod task_store;
pub mod user_store;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use crate::client::{ClientConfig, PocketsApi, RemoteClient};
use crate::credential::{CredentialHolder, FileStore, KeyValueStore, MemoryStore};
use crate::error::AppError;

pub use auth_store::AuthStore;
pub use cache::Cache;
pub use pocket_store::PocketStore;
pub use status::StoreStatus;
pub use task_store::TaskStore;
pub use user_store::UserStore;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Every client-side store, built once at startup and passed around
/// explicitly. Separate instances share nothing.
pub struct ClientContext {
    pub credentials: CredentialHolder,
    pub auth: AuthStore,
    pub pockets: PocketStore,
    pub tasks: TaskStore,
    pub user: UserStore,
    cache: Cache,
}

impl ClientContext {
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let storage: Arc<dyn KeyValueStore> = match &config.storage_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(
        config: &ClientConfig,
        storage: Arc<dyn KeyValueStore>,
    ) -> Result<Self, AppError> {
        let credentials = CredentialHolder::new(storage, config.origin()?);
        let api = Arc::new(RemoteClient::new(config, credentials.clone())?);
        info!("Client context targeting {}", config.base_url);
        Ok(Self::with_api(credentials, api))
    }

    pub fn with_api(credentials: CredentialHolder, api: Arc<dyn PocketsApi>) -> Self {
        let cache = Cache::new();
        Self {
            auth: AuthStore::new(api.clone(), credentials.clone()),
            pockets: PocketStore::new(api.clone(), credentials.clone(), cache.clone()),
            tasks: TaskStore::new(api.clone(), credentials.clone(), cache.clone()),
            user: UserStore::new(api, credentials.clone()),
            credentials,
            cache,
        }
    }

    /// Signs out and drops every cached pocket and task.
    pub fn logout(&self) -> Result<(), AppError> {
        self.auth.logout()?;
        self.cache.write(|cache| cache.clear());
        Ok(())
    }
}
