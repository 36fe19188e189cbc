use std::sync::{Arc, Mutex};

use tracing::info;

use super::lock;
use super::status::StoreStatus;
use crate::client::PocketsApi;
use crate::credential::{CredentialHolder, KeyValueStore};
use crate::error::AppError;
use crate::models::{User, UserProfile};

/// Key of the one-time profile completion flag.
pub const PROFILE_FLAG_KEY: &str = "hasCompletedProfile";

pub struct UserStore {
    api: Arc<dyn PocketsApi>,
    credentials: CredentialHolder,
    storage: Arc<dyn KeyValueStore>,
    user: Mutex<Option<User>>,
    status: StoreStatus,
}

impl UserStore {
    pub fn new(api: Arc<dyn PocketsApi>, credentials: CredentialHolder) -> Self {
        let storage = credentials.storage();
        Self {
            api,
            credentials,
            storage,
            user: Mutex::new(None),
            status: StoreStatus::default(),
        }
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.user).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    pub async fn fetch_user(&self) -> Result<User, AppError> {
        self.status
            .track("fetch user", async {
                self.credentials.require()?;
                let user = self.api.current_user().await?;
                *lock(&self.user) = Some(user.clone());
                Ok(user)
            })
            .await
    }

    /// Updates the names remotely and merges the returned names into the
    /// cached user, if one is loaded.
    pub async fn update_user_info(&self, first_name: &str, last_name: &str) -> Result<(), AppError> {
        self.status
            .track("update user info", async {
                self.credentials.require()?;
                let profile = UserProfile {
                    first_name: first_name.to_string(),
                    last_name: last_name.to_string(),
                };
                let updated = self.api.update_user(&profile).await?;
                if let Some(user) = lock(&self.user).as_mut() {
                    user.first_name = updated.first_name;
                    user.last_name = updated.last_name;
                }
                Ok(())
            })
            .await
    }

    pub fn has_completed_profile(&self) -> bool {
        self.storage.get(PROFILE_FLAG_KEY).as_deref() == Some("true")
    }

    /// Saves the names, reloads the user and sets the completion flag. The
    /// flag is left unset if any step fails.
    pub async fn complete_profile(&self, first_name: &str, last_name: &str) -> Result<(), AppError> {
        self.update_user_info(first_name, last_name).await?;
        self.fetch_user().await?;
        self.storage.set(PROFILE_FLAG_KEY, "true")?;
        info!("Profile completed");
        Ok(())
    }
}
