use std::env;
use std::net::SocketAddr;

use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "https://recruitment-task.jakubcloud.pl";

#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the remote REST service the proxy forwards to.
    pub api_url: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let api_url = env::var("API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut config = Self::new(api_url);

        if let Ok(addr) = env::var("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| AppError::Config(format!("BIND_ADDR {}: {}", addr, e)))?;
        }

        Ok(config)
    }
}
