use std::sync::{Arc, Mutex};

use tracing::info;

use super::lock;
use super::status::StoreStatus;
use crate::client::PocketsApi;
use crate::credential::CredentialHolder;
use crate::error::AppError;
use crate::models::{AuthResponse, LoginCredentials, RegisterCredentials, User};

pub struct AuthStore {
    api: Arc<dyn PocketsApi>,
    credentials: CredentialHolder,
    user: Mutex<Option<User>>,
    status: StoreStatus,
}

impl AuthStore {
    pub fn new(api: Arc<dyn PocketsApi>, credentials: CredentialHolder) -> Self {
        Self {
            api,
            credentials,
            user: Mutex::new(None),
            status: StoreStatus::default(),
        }
    }

    pub fn user(&self) -> Option<User> {
        lock(&self.user).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.get_credential().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    /// Persists the token only when the remote accepts the credentials.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<(), AppError> {
        self.status
            .track("login", async {
                let response = self.api.login(&credentials).await?;
                self.accept(response)
            })
            .await
    }

    pub async fn register(&self, credentials: RegisterCredentials) -> Result<(), AppError> {
        self.status
            .track("register", async {
                let response = self.api.register(&credentials).await?;
                self.accept(response)
            })
            .await
    }

    fn accept(&self, response: AuthResponse) -> Result<(), AppError> {
        self.credentials.set_credential(&response.token)?;
        if let Some(user) = &response.user {
            info!("Signed in as {}", user.id);
        }
        *lock(&self.user) = response.user;
        Ok(())
    }

    pub fn logout(&self) -> Result<(), AppError> {
        self.credentials.clear_credential()?;
        *lock(&self.user) = None;
        self.status.clear_error();
        info!("Signed out");
        Ok(())
    }
}
