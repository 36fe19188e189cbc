//! Navigation gate deciding, from the presence of the credential cookie,
//! whether a page request proceeds or is redirected.

use axum::{
    extract::Request,
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::credential::{TOKEN_KEY, cookie_value};

pub const LOGIN_PATH: &str = "/auth/login";
pub const ROOT_PATH: &str = "/";

const AUTH_SURFACE: &str = "/auth";
const BYPASS_PREFIXES: [&str; 3] = ["/api", "/health", "/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// No credential observed.
    Guarded,
    /// A credential is present. It is not validated here.
    Admitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Proceed,
    Redirect(&'static str),
}

impl GuardState {
    pub fn from_credential(token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => GuardState::Admitted,
            _ => GuardState::Guarded,
        }
    }

    pub fn admit(self, path: &str) -> Admission {
        if BYPASS_PREFIXES.iter().any(|prefix| under(path, prefix)) {
            return Admission::Proceed;
        }

        match (self, under(path, AUTH_SURFACE)) {
            (GuardState::Admitted, true) => Admission::Redirect(ROOT_PATH),
            (GuardState::Guarded, false) => Admission::Redirect(LOGIN_PATH),
            _ => Admission::Proceed,
        }
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub async fn route_guard(request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| cookie_value(header, TOKEN_KEY));

    let path = request.uri().path();
    match GuardState::from_credential(token).admit(path) {
        Admission::Proceed => next.run(request).await,
        Admission::Redirect(target) => {
            debug!("Redirecting {} to {}", path, target);
            Redirect::temporary(target).into_response()
        }
    }
}
