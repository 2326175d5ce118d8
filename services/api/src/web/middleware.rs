//! services/api/src/web/middleware.rs
//!
//! Authentication middleware that resolves the caller from the session cookie.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use cooking_assistant_core::ports::PortError;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::web::{envelope::Failure, state::AppState};

/// Name of the cookie carrying the auth session id.
pub const SESSION_COOKIE: &str = "session_id";

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Middleware that validates the auth session cookie and extracts the user_id.
///
/// A missing, unknown or expired cookie does not reject the request: the
/// extension is simply left out and the handler answers `Unauthenticated`.
/// Any other store failure is answered here as an error envelope.
pub async fn resolve_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(auth_session_id) = session_cookie(req.headers()).map(str::to_owned) {
        match state.accounts.validate_auth_session(&auth_session_id).await {
            Ok(user_id) => {
                req.extensions_mut().insert(AuthUser(user_id));
            }
            Err(e @ (PortError::Unauthenticated | PortError::NotFound(_))) => {
                debug!("Ignoring auth session cookie: {}", e)
            }
            Err(e) => return Failure(e).into_response(),
        }
    }

    next.run(req).await
}

/// Reads the auth session id from the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
}

/// The caller's id, if the middleware resolved one.
pub fn caller(user: Option<Extension<AuthUser>>) -> Option<Uuid> {
    user.map(|Extension(AuthUser(user_id))| user_id)
}
