//! Session cookie handling and the request-scoped auth guard

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::Redirect;
use uuid::Uuid;

use crate::state::AppState;

/// Cookie carrying the opaque session token
pub const SESSION_COOKIE: &str = "worklens_session";

/// Pull the session token out of the Cookie header, if present
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Resolve the request's session to a user id, if the token is valid
pub fn current_user(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    let token = session_token(headers)?;
    state.ctx.session_service.resolve(&token)
}

/// Auth guard for protected routes.
///
/// Resolves the session cookie once per handler. A missing or invalid
/// session rejects with a redirect to the login entry point - handlers
/// behind this extractor never see unauthenticated requests.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        current_user(state, &parts.headers)
            .map(AuthUser)
            .ok_or_else(|| Redirect::to("/"))
    }
}

/// Set-Cookie value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// Set-Cookie value clearing the session on logout
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
