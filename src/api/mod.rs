//! Pass-through routes. Each handler forwards the call to the same path on the
//! remote service and relays the answer: success as 200 with the remote body,
//! failure with the remote status and body. Local failures, and a success
//! whose body is not JSON, answer 500 with a per-route message.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::error::{AppError, INVALID_RESPONSE_MESSAGE};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register).options(register_preflight))
        .route("/pockets", get(list_pockets).post(create_pocket))
        .route("/pockets/{id}", delete(delete_pocket))
        .route("/pockets/{id}/tasks", get(list_tasks).post(create_task))
        .route("/pockets/{id}/tasks/{task_id}", put(update_task).delete(delete_task))
        .route("/users/me", get(current_user))
        .route("/users/update", put(update_user))
        .with_state(state)
}

/// What the remote answered: its status and, if it decoded, its JSON body.
struct Upstream {
    status: StatusCode,
    body: Option<Value>,
}

impl Upstream {
    /// Relays the remote answer. A success without a JSON body fails with
    /// `failure`.
    fn relay(self, failure: &'static str) -> Result<Response, AppError> {
        if self.status.is_success() && self.body.is_none() {
            warn!("{}: remote answered {} without a JSON body", failure, self.status);
            return Err(AppError::Forward(failure));
        }
        Ok(self.relay_lenient())
    }

    /// Relays the remote answer, standing in the generic message for any body
    /// that did not decode, successful or not.
    fn relay_lenient(self) -> Response {
        let body = self
            .body
            .unwrap_or_else(|| json!({ "message": INVALID_RESPONSE_MESSAGE }));
        if self.status.is_success() {
            Json(body).into_response()
        } else {
            (self.status, Json(body)).into_response()
        }
    }

    /// Relays failures; a success is answered with `message` instead of the
    /// remote body.
    fn relay_or(self, message: String) -> Response {
        if self.status.is_success() {
            Json(json!({ "message": message })).into_response()
        } else {
            self.relay_lenient()
        }
    }
}

/// Registration fields passed through to the remote. Missing ones are left
/// out so the remote can reject the request itself.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    login: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<Value>,
}

impl AppState {
    async fn forward(
        &self,
        method: Method,
        path: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> Result<Upstream, reqwest::Error> {
        let url = format!("{}{}", self.config.api_url, path);

        let mut request = self.http.request(method, &url);
        if let Some(authorization) = authorization {
            request = request.header(header::AUTHORIZATION, authorization);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = match serde_json::from_slice::<Value>(&bytes) {
            Ok(body) => Some(body),
            Err(e) => {
                if !bytes.is_empty() {
                    warn!("Error parsing response JSON from {}: {}", path, e);
                }
                None
            }
        };

        Ok(Upstream { status, body })
    }
}

fn require_authorization(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::MissingAuthorization)
}

fn parse_body(bytes: &Bytes, failure: &'static str) -> Result<Value, AppError> {
    serde_json::from_slice(bytes).map_err(|e| {
        error!("Malformed request body: {}", e);
        AppError::Forward(failure)
    })
}

fn failed(failure: &'static str) -> impl FnOnce(reqwest::Error) -> AppError {
    move |e| {
        error!("{}: {}", failure, e);
        AppError::Forward(failure)
    }
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    const FAILURE: &str = "Login failed";
    let body = parse_body(&body, FAILURE)?;
    let upstream = state
        .forward(Method::POST, "/auth/login", None, Some(body))
        .await
        .map_err(failed(FAILURE))?;
    upstream.relay(FAILURE)
}

async fn register(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    const FAILURE: &str = "Registration failed";
    let fields: RegisterBody = serde_json::from_slice(&body).map_err(|e| {
        error!("Malformed registration body: {}", e);
        AppError::Forward(FAILURE)
    })?;
    let body = serde_json::to_value(&fields).map_err(|_| AppError::Forward(FAILURE))?;
    let upstream = state
        .forward(Method::POST, "/auth/register", None, Some(body))
        .await
        .map_err(failed(FAILURE))?;
    upstream.relay(FAILURE)
}

async fn register_preflight() -> impl IntoResponse {
    (
        [
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type, Authorization"),
            ),
        ],
        Json(json!({})),
    )
}

async fn list_pockets(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let authorization = require_authorization(&headers)?;
    let upstream = state
        .forward(Method::GET, "/pockets", Some(authorization), None)
        .await
        .map_err(failed("Failed to fetch pockets"))?;
    Ok(upstream.relay_lenient())
}

async fn create_pocket(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    const FAILURE: &str = "Failed to create pocket";
    let authorization = require_authorization(&headers)?;
    let body = parse_body(&body, FAILURE)?;
    let upstream = state
        .forward(Method::POST, "/pockets", Some(authorization), Some(body))
        .await
        .map_err(failed(FAILURE))?;
    Ok(upstream.relay_lenient())
}

async fn delete_pocket(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let authorization = require_authorization(&headers)?;
    let upstream = state
        .forward(
            Method::DELETE,
            &format!("/pockets/{}", id),
            Some(authorization),
            None,
        )
        .await
        .map_err(failed("Failed to delete pocket"))?;
    Ok(upstream.relay_or(format!("Pocket with ID {} deleted successfully", id)))
}

async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let authorization = require_authorization(&headers)?;
    let upstream = state
        .forward(
            Method::GET,
            &format!("/pockets/{}/tasks", id),
            Some(authorization),
            None,
        )
        .await
        .map_err(failed("Failed to fetch tasks"))?;
    upstream.relay("Failed to fetch tasks")
}

async fn create_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    const FAILURE: &str = "Failed to add task";
    let authorization = require_authorization(&headers)?;
    let body = parse_body(&body, FAILURE)?;
    let upstream = state
        .forward(
            Method::POST,
            &format!("/pockets/{}/tasks", id),
            Some(authorization),
            Some(body),
        )
        .await
        .map_err(failed(FAILURE))?;
    upstream.relay(FAILURE)
}

async fn update_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    const FAILURE: &str = "Failed to update task";
    let authorization = require_authorization(&headers)?;
    let body = parse_body(&body, FAILURE)?;
    let upstream = state
        .forward(
            Method::PUT,
            &format!("/pockets/{}/tasks/{}", id, task_id),
            Some(authorization),
            Some(body),
        )
        .await
        .map_err(failed(FAILURE))?;
    upstream.relay(FAILURE)
}

async fn delete_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let authorization = require_authorization(&headers)?;
    let upstream = state
        .forward(
            Method::DELETE,
            &format!("/pockets/{}/tasks/{}", id, task_id),
            Some(authorization),
            None,
        )
        .await
        .map_err(failed("Failed to delete task"))?;
    Ok(upstream.relay_or(format!("Task with ID {} deleted successfully", task_id)))
}

async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let authorization = require_authorization(&headers)?;
    let upstream = state
        .forward(Method::GET, "/users/me", Some(authorization), None)
        .await
        .map_err(failed("Failed to fetch user data"))?;
    upstream.relay("Failed to fetch user data")
}

async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    const FAILURE: &str = "Failed to update user info";
    let authorization = require_authorization(&headers)?;
    let body = parse_body(&body, FAILURE)?;
    let upstream = state
        .forward(Method::PUT, "/users/update", Some(authorization), Some(body))
        .await
        .map_err(failed(FAILURE))?;
    upstream.relay(FAILURE)
}
