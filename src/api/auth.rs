//! Session authentication for the admin API.
//!
//! Sessions are bearer tokens stored hashed (SHA-256) in the database.
//! The token travels either in an HttpOnly `session` cookie (set by the
//! login endpoint) or in an `Authorization: Bearer` header.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{
    actions, log_audit, resource_types, DbPool, LoginRequest, LoginResponse, Session, User,
    UserResponse, ROLE_ADMIN,
};
use crate::AppState;

use super::audit::extract_client_ip;
use super::error::ApiError;

pub const SESSION_COOKIE: &str = "session";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random session token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Create the bootstrap admin account when no user exists yet.
///
/// When no password is configured a random one is generated and logged
/// once, so a fresh install is never reachable with a known credential.
pub async fn ensure_admin_user(db: &DbPool, auth: &AuthConfig) -> anyhow::Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let password = match &auth.admin_password {
        Some(p) => p.clone(),
        None => {
            let mut rng = rand::rng();
            let bytes: [u8; 12] = rng.random();
            let generated = hex::encode(bytes);
            tracing::warn!(
                email = %auth.admin_email,
                password = %generated,
                "No admin password configured; generated one for the bootstrap account"
            );
            generated
        }
    };

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    sqlx::query(
        r#"
        INSERT INTO users (id, email, password_hash, name, role, created_at, updated_at)
        VALUES (?, ?, ?, 'Administrator', ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&auth.admin_email)
    .bind(&password_hash)
    .bind(ROLE_ADMIN)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    tracing::info!(email = %auth.admin_email, "Created bootstrap admin user");
    Ok(())
}

/// Drop sessions past their expiry so the table only holds live tokens.
/// Runs opportunistically on every successful login.
async fn purge_expired_sessions(db: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(db)
        .await?;
    Ok(())
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Login endpoint: verifies credentials, mints a session and sets the
/// session cookie. The token is also returned for header-based clients.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    purge_expired_sessions(&state.db).await?;

    let token = generate_token();
    let token_hash = hash_token(&token);

    let expires_at = (chrono::Utc::now()
        + chrono::Duration::days(state.config.auth.session_ttl_days))
    .to_rfc3339();

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(&user.id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(&state.db)
        .await?;

    let ip = extract_client_ip(&headers, None);
    if let Err(e) = log_audit(
        &state.db,
        actions::AUTH_LOGIN,
        resource_types::USER,
        Some(&user.id),
        Some(&user.email),
        Some(&user.id),
        ip.as_deref(),
    )
    .await
    {
        tracing::warn!(error = %e, "Failed to record login audit entry");
    }

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

/// Logout endpoint: drops the session row and clears the cookie.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if let Some(token) = extract_token(&headers, &jar) {
        let token_hash = hash_token(&token);

        let session: Option<Session> =
            sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ?")
                .bind(&token_hash)
                .fetch_optional(&state.db)
                .await?;

        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(&token_hash)
            .execute(&state.db)
            .await?;

        if let Some(session) = session {
            let ip = extract_client_ip(&headers, None);
            if let Err(e) = log_audit(
                &state.db,
                actions::AUTH_LOGOUT,
                resource_types::USER,
                Some(&session.user_id),
                None,
                Some(&session.user_id),
                ip.as_deref(),
            )
            .await
            {
                tracing::warn!(error = %e, "Failed to record logout audit entry");
            }
        }
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    Ok((jar.remove(removal), StatusCode::NO_CONTENT))
}

/// Current-user endpoint
pub async fn me(user: User) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Extract the session token from the cookie or the Authorization header
fn extract_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let value = cookie.value();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Look up the user behind a live session token
pub async fn get_current_user(pool: &DbPool, token: &str) -> Result<User, ApiError> {
    let token_hash = hash_token(token);
    let now = chrono::Utc::now().to_rfc3339();

    let session: Option<Session> =
        sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?")
            .bind(&token_hash)
            .bind(&now)
            .fetch_optional(pool)
            .await?;

    let session = session.ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&session.user_id)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| ApiError::unauthorized("Session expired or invalid"))
}

/// Extractor for the current authenticated user
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = extract_token(&parts.headers, &jar)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
        get_current_user(&state.db, &token).await
    }
}

/// Middleware gating the admin routes: requires a live session whose
/// user carries the admin role.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), &jar)
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = get_current_user(&state.db, &token).await?;

    if !user.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash));
        assert!(!verify_password("wrong password", &hash));
        assert!(!verify_password("anything", "not-a-valid-hash"));
    }

    #[test]
    fn test_tokens_are_unique_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(hash_token(&a), a);
        assert_eq!(hash_token(&a), hash_token(&a));
    }

    #[tokio::test]
    async fn test_ensure_admin_user_is_idempotent() {
        let db = test_pool().await;
        let auth = AuthConfig {
            admin_email: "admin@example.org".to_string(),
            admin_password: Some("hunter2hunter2".to_string()),
            session_ttl_days: 7,
        };

        ensure_admin_user(&db, &auth).await.unwrap();
        ensure_admin_user(&db, &auth).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        let user: User = sqlx::query_as("SELECT * FROM users WHERE email = 'admin@example.org'")
            .fetch_one(&db)
            .await
            .unwrap();
        assert!(user.is_admin());
        assert!(verify_password("hunter2hunter2", &user.password_hash));
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired_sessions() {
        let db = test_pool().await;
        let auth = AuthConfig {
            admin_email: "admin@example.org".to_string(),
            admin_password: Some("hunter2hunter2".to_string()),
            session_ttl_days: 7,
        };
        ensure_admin_user(&db, &auth).await.unwrap();

        let user: User = sqlx::query_as("SELECT * FROM users")
            .fetch_one(&db)
            .await
            .unwrap();

        for days in [-2i64, -1, 1] {
            let expires_at = (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339();
            sqlx::query(
                "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&user.id)
            .bind(hash_token(&generate_token()))
            .bind(&expires_at)
            .execute(&db)
            .await
            .unwrap();
        }

        purge_expired_sessions(&db).await.unwrap();

        let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(remaining.0, 1);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let db = test_pool().await;
        let auth = AuthConfig {
            admin_email: "admin@example.org".to_string(),
            admin_password: Some("hunter2hunter2".to_string()),
            session_ttl_days: 7,
        };
        ensure_admin_user(&db, &auth).await.unwrap();

        let user: User = sqlx::query_as("SELECT * FROM users")
            .fetch_one(&db)
            .await
            .unwrap();

        let token = generate_token();
        let expired = (chrono::Utc::now() - chrono::Duration::days(1)).to_rfc3339();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&user.id)
        .bind(hash_token(&token))
        .bind(&expired)
        .execute(&db)
        .await
        .unwrap();

        assert!(get_current_user(&db, &token).await.is_err());

        let live = (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339();
        sqlx::query("UPDATE sessions SET expires_at = ?")
            .bind(&live)
            .execute(&db)
            .await
            .unwrap();

        let found = get_current_user(&db, &token).await.unwrap();
        assert_eq!(found.id, user.id);
    }
}
