pub mod config;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credential::CredentialHolder;
use crate::error::{AppError, INVALID_RESPONSE_MESSAGE};
use crate::models::{
    AuthResponse, LoginCredentials, NewPocketRequest, NewTaskRequest, Pocket, RegisterCredentials,
    Task, TaskPatch, UpdateTaskRequest, User, UserProfile,
};

pub use config::ClientConfig;

/// Operations of the remote task service the stores depend on.
#[async_trait]
pub trait PocketsApi: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AppError>;
    async fn register(&self, credentials: &RegisterCredentials) -> Result<AuthResponse, AppError>;
    async fn list_pockets(&self) -> Result<Vec<Pocket>, AppError>;
    async fn create_pocket(&self, req: &NewPocketRequest) -> Result<Pocket, AppError>;
    async fn delete_pocket(&self, pocket_id: &str) -> Result<(), AppError>;
    async fn list_tasks(&self, pocket_id: &str) -> Result<Vec<Task>, AppError>;
    async fn create_task(&self, pocket_id: &str, req: &NewTaskRequest) -> Result<Task, AppError>;
    async fn update_task(
        &self,
        pocket_id: &str,
        task_id: &str,
        req: &UpdateTaskRequest,
    ) -> Result<TaskPatch, AppError>;
    async fn delete_task(&self, pocket_id: &str, task_id: &str) -> Result<(), AppError>;
    async fn current_user(&self) -> Result<User, AppError>;
    async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;
}

/// HTTP client for the remote service (usually reached through the proxy).
///
/// Attaches `Authorization: Bearer <token>` whenever the credential holder has
/// a token. No retries, no caching, no de-duplication of concurrent calls.
pub struct RemoteClient {
    http: Client,
    base_url: String,
    credentials: CredentialHolder,
}

impl RemoteClient {
    pub fn new(config: &ClientConfig, credentials: CredentialHolder) -> Result<Self, AppError> {
        let http = Client::builder()
            .cookie_provider(credentials.cookie_jar())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Sends one request and returns the decoded JSON body. An empty success
    /// body decodes as `null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = self.credentials.get_credential() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(status, &bytes);
            warn!("{} {} failed with {}: {}", method, path, status, message);
            return Err(AppError::Remote { status, message });
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            warn!("{} {} returned undecodable body: {}", method, path, e);
            AppError::InvalidResponse { status }
        })
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, AppError> {
        let value = self.request(method, path, body).await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Option<Value>, AppError> {
    Ok(Some(serde_json::to_value(value)?))
}

/// Message carried by a failed response. Bodies that are not JSON are
/// replaced by the generic invalid-response message.
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    let Ok(body) = serde_json::from_slice::<Value>(bytes) else {
        return INVALID_RESPONSE_MESSAGE.to_string();
    };

    match body.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => format!("Request failed with status {}", status.as_u16()),
    }
}

#[async_trait]
impl PocketsApi for RemoteClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, AppError> {
        self.fetch(Method::POST, "/auth/login", to_body(credentials)?).await
    }

    async fn register(&self, credentials: &RegisterCredentials) -> Result<AuthResponse, AppError> {
        self.fetch(Method::POST, "/auth/register", to_body(credentials)?).await
    }

    async fn list_pockets(&self) -> Result<Vec<Pocket>, AppError> {
        self.fetch(Method::GET, "/pockets", None).await
    }

    async fn create_pocket(&self, req: &NewPocketRequest) -> Result<Pocket, AppError> {
        self.fetch(Method::POST, "/pockets", to_body(req)?).await
    }

    async fn delete_pocket(&self, pocket_id: &str) -> Result<(), AppError> {
        self.request(Method::DELETE, &format!("/pockets/{}", pocket_id), None)
            .await?;
        Ok(())
    }

    async fn list_tasks(&self, pocket_id: &str) -> Result<Vec<Task>, AppError> {
        let mut tasks: Vec<Task> = self
            .fetch(Method::GET, &format!("/pockets/{}/tasks", pocket_id), None)
            .await?;
        for task in tasks.iter_mut().filter(|t| t.pocket_id.is_empty()) {
            task.pocket_id = pocket_id.to_string();
        }
        Ok(tasks)
    }

    async fn create_task(&self, pocket_id: &str, req: &NewTaskRequest) -> Result<Task, AppError> {
        let mut task: Task = self
            .fetch(
                Method::POST,
                &format!("/pockets/{}/tasks", pocket_id),
                to_body(req)?,
            )
            .await?;
        if task.pocket_id.is_empty() {
            task.pocket_id = pocket_id.to_string();
        }
        Ok(task)
    }

    async fn update_task(
        &self,
        pocket_id: &str,
        task_id: &str,
        req: &UpdateTaskRequest,
    ) -> Result<TaskPatch, AppError> {
        let value = self
            .request(
                Method::PUT,
                &format!("/pockets/{}/tasks/{}", pocket_id, task_id),
                to_body(req)?,
            )
            .await?;
        let patch = if value.is_null() {
            TaskPatch::default()
        } else {
            serde_json::from_value(value)?
        };
        Ok(patch.or_requested(req))
    }

    async fn delete_task(&self, pocket_id: &str, task_id: &str) -> Result<(), AppError> {
        self.request(
            Method::DELETE,
            &format!("/pockets/{}/tasks/{}", pocket_id, task_id),
            None,
        )
        .await?;
        Ok(())
    }

    async fn current_user(&self) -> Result<User, AppError> {
        self.fetch(Method::GET, "/users/me", None).await
    }

    async fn update_user(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        self.fetch(Method::PUT, "/users/update", to_body(profile)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_variants() {
        let status = StatusCode::UNAUTHORIZED;
        assert_eq!(
            error_message(status, br#"{"message":"invalid credentials"}"#),
            "invalid credentials"
        );
        assert_eq!(
            error_message(status, br#"{"message":["name is empty","emoji is empty"]}"#),
            "name is empty, emoji is empty"
        );
        assert_eq!(
            error_message(status, br#"{"error":"nope"}"#),
            "Request failed with status 401"
        );
        assert_eq!(error_message(status, b"<html>"), INVALID_RESPONSE_MESSAGE);
    }
}
