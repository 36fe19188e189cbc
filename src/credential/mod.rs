pub mod storage;

use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use tracing::{debug, info};

use crate::error::AppError;

pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Name used for the token both in the key-value store and as a cookie.
pub const TOKEN_KEY: &str = "token";

/// Holds the single bearer token of a session.
///
/// The token lives in two places: the key-value store, read by the client
/// before every request, and a cookie in the HTTP client's jar, which the
/// server-side route guard observes on navigation. Both are written
/// synchronously so a read right after a write sees it.
#[derive(Clone)]
pub struct CredentialHolder {
    storage: Arc<dyn KeyValueStore>,
    cookies: Arc<Jar>,
    origin: Url,
}

impl CredentialHolder {
    pub fn new(storage: Arc<dyn KeyValueStore>, origin: Url) -> Self {
        Self {
            storage,
            cookies: Arc::new(Jar::default()),
            origin,
        }
    }

    /// Stores `token` without validating its shape.
    pub fn set_credential(&self, token: &str) -> Result<(), AppError> {
        self.storage.set(TOKEN_KEY, token)?;
        self.cookies
            .add_cookie_str(&format!("{TOKEN_KEY}={token}; Path=/"), &self.origin);
        info!("Credential stored");
        Ok(())
    }

    pub fn get_credential(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    /// Like [`get_credential`](Self::get_credential), failing locally when absent.
    pub fn require(&self) -> Result<String, AppError> {
        self.get_credential().ok_or(AppError::Unauthenticated)
    }

    pub fn clear_credential(&self) -> Result<(), AppError> {
        self.storage.remove(TOKEN_KEY)?;
        self.cookies.add_cookie_str(
            &format!("{TOKEN_KEY}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT"),
            &self.origin,
        );
        debug!("Credential cleared");
        Ok(())
    }

    /// Token as currently visible through the cookie jar.
    pub fn cookie_credential(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.origin)?;
        let header = header.to_str().ok()?;
        cookie_value(header, TOKEN_KEY).map(str::to_string)
    }

    pub fn cookie_jar(&self) -> Arc<Jar> {
        self.cookies.clone()
    }

    pub fn storage(&self) -> Arc<dyn KeyValueStore> {
        self.storage.clone()
    }
}

/// Looks up a non-empty cookie by name in a `Cookie` header value.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder() -> CredentialHolder {
        CredentialHolder::new(
            Arc::new(MemoryStore::new()),
            Url::parse("http://127.0.0.1:3000/api").unwrap(),
        )
    }

    #[test]
    fn set_is_visible_in_both_places() {
        let holder = holder();
        assert_eq!(holder.get_credential(), None);
        assert_eq!(holder.cookie_credential(), None);

        holder.set_credential("abc").unwrap();
        assert_eq!(holder.get_credential().as_deref(), Some("abc"));
        assert_eq!(holder.cookie_credential().as_deref(), Some("abc"));
    }

    #[test]
    fn clear_removes_both_places() {
        let holder = holder();
        holder.set_credential("abc").unwrap();
        holder.clear_credential().unwrap();

        assert_eq!(holder.get_credential(), None);
        assert_eq!(holder.cookie_credential(), None);
        assert!(matches!(holder.require(), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn cookie_value_parsing() {
        assert_eq!(cookie_value("a=1; token=xyz", "token"), Some("xyz"));
        assert_eq!(cookie_value("token=", "token"), None);
        assert_eq!(cookie_value("tokens=1", "token"), None);
        assert_eq!(cookie_value("", "token"), None);
    }
}
