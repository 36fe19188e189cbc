use std::env;
use std::path::PathBuf;

use reqwest::Url;

use crate::error::AppError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000/api";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base every request path is appended to, e.g. `http://host/api`.
    pub base_url: String,
    /// Backing file for the key-value store; in-memory when `None`.
    pub storage_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            storage_path: None,
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url =
            env::var("POCKETS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let storage_path = env::var("POCKETS_STORAGE").ok().map(PathBuf::from);

        let config = Self {
            base_url,
            storage_path,
        };
        config.origin()?;
        Ok(config)
    }

    /// The application origin the credential cookie is scoped to.
    pub fn origin(&self) -> Result<Url, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("invalid base url {}: {}", self.base_url, e)))?;
        url.set_path("/");
        url.set_query(None);
        Ok(url)
    }
}
