use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: Client,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let http = Client::builder().build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }
}
