//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, logout and the current user.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Extension, Json,
};
use chrono::{Duration, Utc};
use cooking_assistant_core::{engine::require_user, ports::PortError};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::web::{
    dto::{AuthResponse, LoginRequest, SignupRequest},
    envelope::{Failure, Success},
    middleware::{caller, session_cookie, AuthUser, SESSION_COOKIE},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

fn normalize_email(email: &str) -> Result<String, Failure> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Failure::invalid_input("email address is not valid")),
    }
}

/// Creates a new auth session for the user and returns the `Set-Cookie` value.
async fn issue_session(state: &AppState, user_id: Uuid) -> Result<String, Failure> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.auth_session_ttl_days);
    state
        .accounts
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await?;

    Ok(format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        ttl.num_seconds()
    ))
}

/// POST /api/auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Envelope with the new user and a session cookie, or an error envelope (400, 409)", body = AuthResponse),
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Failure> {
    let Json(req) = body.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Failure::invalid_input(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    // 1. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            Failure(PortError::Unexpected("failed to hash password".to_string()))
        })?
        .to_string();

    // 2. Create user, then log them in
    let user = state
        .accounts
        .create_user_with_email(&email, &password_hash)
        .await?;
    let cookie = issue_session(&state, user.user_id).await?;
    info!("New user {} signed up", user.user_id);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Success(AuthResponse {
            user_id: user.user_id,
            email: user.email.unwrap_or_default(),
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Envelope with the user and a session cookie, or an error envelope (400, 401)", body = AuthResponse),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, Failure> {
    let Json(req) = body.map_err(|e| Failure::invalid_input(e.body_text()))?;
    let email = normalize_email(&req.email)?;

    // 1. Get user by email
    let user_creds = match state.accounts.get_user_by_email(&email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(Failure(PortError::Unauthenticated)),
        Err(e) => return Err(Failure(e)),
    };

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        Failure(PortError::Unexpected("authentication error".to_string()))
    })?;
    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(Failure(PortError::Unauthenticated));
    }

    let cookie = issue_session(&state, user_creds.user_id).await?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Success(AuthResponse {
            user_id: user_creds.user_id,
            email: user_creds.email,
        }),
    ))
}

/// POST /api/auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Empty envelope; the session cookie is cleared"),
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Failure> {
    if let Some(auth_session_id) = session_cookie(&headers) {
        state.accounts.delete_auth_session(auth_session_id).await?;
    }

    let cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", SESSION_COOKIE);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Success(serde_json::json!({})),
    ))
}

/// GET /api/auth/me - The logged-in user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Envelope with the user, or an error envelope (401)", body = AuthResponse),
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
) -> Result<Success<AuthResponse>, Failure> {
    let user_id = require_user(caller(user))?;
    let user = state.accounts.get_user(user_id).await?;
    Ok(Success(AuthResponse {
        user_id: user.user_id,
        email: user.email.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Cook@Example.COM ").unwrap(),
            "cook@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(normalize_email("cook").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("cook@localhost").is_err());
    }
}
