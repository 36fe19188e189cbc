use axum::{Router, http::StatusCode, middleware, response::Html, routing::get};

use crate::api;
use crate::guard::route_guard;
use crate::state::AppState;

const PAGE_SHELL: &str = "<!doctype html><html><head><meta charset=\"utf-8\"><title>Pockets</title></head><body><div id=\"app\"></div></body></html>";

/// Health check, the `/api` pass-through surface and the guarded pages.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api::router(state))
        .fallback(page)
        .layer(middleware::from_fn(route_guard))
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn page() -> Html<&'static str> {
    Html(PAGE_SHELL)
}
