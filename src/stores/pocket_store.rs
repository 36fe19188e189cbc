use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::cache::Cache;
use super::status::StoreStatus;
use crate::client::PocketsApi;
use crate::credential::CredentialHolder;
use crate::error::AppError;
use crate::models::{NewPocketRequest, Pocket};

/// Cached pocket list plus the current selection.
pub struct PocketStore {
    api: Arc<dyn PocketsApi>,
    credentials: CredentialHolder,
    cache: Cache,
    status: StoreStatus,
    generation: AtomicU64,
    applied: AtomicU64,
}

impl PocketStore {
    pub fn new(api: Arc<dyn PocketsApi>, credentials: CredentialHolder, cache: Cache) -> Self {
        Self {
            api,
            credentials,
            cache,
            status: StoreStatus::default(),
            generation: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn pockets(&self) -> Vec<Pocket> {
        self.cache.read(|c| c.pockets())
    }

    pub fn selected_pocket_id(&self) -> Option<String> {
        self.cache.read(|c| c.selected_pocket_id().map(str::to_string))
    }

    /// The selected pocket, if it is still cached.
    pub fn selected_pocket(&self) -> Option<Pocket> {
        self.cache
            .read(|c| c.selected_pocket_id().and_then(|id| c.pocket(id)))
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Marks `ticket` as applied unless a later fetch already was. Must be
    /// called under the cache write lock.
    fn claim(&self, ticket: u64) -> bool {
        self.applied.fetch_max(ticket, Ordering::SeqCst) < ticket
    }

    /// Replaces the cached list with the server's. On failure the previous
    /// list stays in place. A response older than one already applied is
    /// discarded.
    pub async fn fetch_pockets(&self) -> Result<(), AppError> {
        self.status
            .track("fetch pockets", async {
                self.credentials.require()?;
                let ticket = self.next_ticket();
                let pockets = self.api.list_pockets().await?;
                let count = pockets.len();

                let applied = self.cache.write(|cache| {
                    if !self.claim(ticket) {
                        return false;
                    }
                    cache.replace_pockets(pockets);
                    true
                });
                if applied {
                    info!("Fetched {} pockets", count);
                } else {
                    debug!("Discarding stale pocket list (ticket {})", ticket);
                }
                Ok(())
            })
            .await
    }

    /// Fetches the pocket list, then every pocket's tasks concurrently. The
    /// cache is replaced once all task fetches settle; a pocket whose tasks
    /// failed to load is kept with `tasks` unset.
    pub async fn fetch_pockets_with_tasks(&self) -> Result<(), AppError> {
        self.status
            .track("fetch pockets with tasks", async {
                self.credentials.require()?;
                let ticket = self.next_ticket();
                let pockets = self.api.list_pockets().await?;

                let results =
                    join_all(pockets.iter().map(|p| self.api.list_tasks(&p.id))).await;

                let mut tasks = HashMap::new();
                for (pocket, result) in pockets.iter().zip(results) {
                    match result {
                        Ok(list) => {
                            tasks.insert(pocket.id.clone(), list);
                        }
                        Err(e) => warn!("Failed to fetch tasks for pocket {}: {}", pocket.id, e),
                    }
                }

                let (pocket_count, loaded) = (pockets.len(), tasks.len());
                let applied = self.cache.write(|cache| {
                    if !self.claim(ticket) {
                        return false;
                    }
                    cache.replace_all(pockets, tasks);
                    true
                });
                if applied {
                    info!("Fetched {} pockets ({} with tasks)", pocket_count, loaded);
                } else {
                    debug!("Discarding stale pocket list (ticket {})", ticket);
                }
                Ok(())
            })
            .await
    }

    /// Creates a pocket and appends the server's copy. Callers are expected to
    /// reject blank names beforehand.
    pub async fn create_pocket(&self, name: &str, emoji: &str) -> Result<Pocket, AppError> {
        self.status
            .track("create pocket", async {
                self.credentials.require()?;
                let req = NewPocketRequest {
                    name: name.to_string(),
                    emoji: emoji.to_string(),
                };
                let pocket = self.api.create_pocket(&req).await?;
                info!("Created pocket {}", pocket.id);
                self.cache.write(|cache| cache.push_pocket(pocket.clone()));
                Ok(pocket)
            })
            .await
    }

    pub async fn delete_pocket(&self, pocket_id: &str) -> Result<(), AppError> {
        self.status
            .track("delete pocket", async {
                self.credentials.require()?;
                self.api.delete_pocket(pocket_id).await?;
                self.cache.write(|cache| cache.remove_pocket(pocket_id));
                info!("Deleted pocket {}", pocket_id);
                Ok(())
            })
            .await
    }

    /// Local selection only; the id is not checked against the cache and the
    /// pocket's tasks are not loaded.
    pub fn select_pocket(&self, pocket_id: impl Into<String>) {
        let pocket_id = pocket_id.into();
        self.cache.write(|cache| cache.select(Some(pocket_id)));
    }

    pub fn clear_selection(&self) {
        self.cache.write(|cache| cache.select(None));
    }
}
