//! Session management and the identity-resolution seam.
//!
//! Login state lives in a per-instance session table keyed by opaque
//! tokens; nothing here touches process globals. Identity lookups go
//! through [`IdentityProvider`] so handlers and middleware can be tested
//! without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use argon2::Argon2;
use argon2::password_hash::{
    Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};
use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::{CONTENT_TYPE, COOKIE};
use axum::middleware::Next;
use axum::response::Response;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::{debug, error};
use uuid::Uuid;

use patchbay_data::users::UserRow;
use patchbay_data::{Store, users};

use crate::http::constants::{FORM_BODY_LIMIT, SESSION_COOKIE};
use crate::http::errors::{ApiError, map_data_error};
use crate::state::ApiState;

const SESSION_TOKEN_LEN: usize = 32;

/// Resolves accounts for the two authentication paths.
///
/// `resolve_by_identity` backs session cookies; `resolve_by_request` backs
/// credentials carried on the request itself.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the account a stored session identity refers to.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup itself fails; an unknown identity is
    /// `Ok(None)`.
    async fn resolve_by_identity(&self, id: Uuid) -> Result<Option<UserRow>, ApiError>;

    /// Resolves an account from a login name carried on the request.
    ///
    /// Names are not unique; implementations must return the earliest-created
    /// match so repeated lookups stay deterministic.
    ///
    /// # Errors
    ///
    /// Returns an error when the lookup itself fails; an unknown name is
    /// `Ok(None)`.
    async fn resolve_by_request(&self, name: &str) -> Result<Option<UserRow>, ApiError>;
}

/// [`IdentityProvider`] backed by the relational store.
#[derive(Clone)]
pub struct StoreIdentityProvider {
    store: Store,
}

impl StoreIdentityProvider {
    /// Wraps a store handle.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityProvider for StoreIdentityProvider {
    async fn resolve_by_identity(&self, id: Uuid) -> Result<Option<UserRow>, ApiError> {
        users::fetch_user_by_id(self.store.pool(), id)
            .await
            .map_err(|err| map_data_error(&err, "fetch_user_by_id"))
    }

    async fn resolve_by_request(&self, name: &str) -> Result<Option<UserRow>, ApiError> {
        users::fetch_user_by_name(self.store.pool(), name)
            .await
            .map_err(|err| map_data_error(&err, "fetch_user_by_name"))
    }
}

/// Outcome of a successful login.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Opaque token handed back to the client as a cookie.
    pub token: String,
    /// The authenticated account.
    pub user: UserRow,
}

/// Authenticated account attached to the request by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRow);

#[derive(Debug, Clone, Copy)]
struct SessionEntry {
    user_id: Uuid,
    expires_at: Instant,
}

/// Issues, resolves, and revokes login sessions.
///
/// Sessions are scoped to one application instance and vanish with it;
/// a second instance in the same process holds its own table.
#[derive(Clone)]
pub struct AuthManager {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    identity: Arc<dyn IdentityProvider>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
    session_ttl: Duration,
}

impl AuthManager {
    /// Builds a manager over the given identity source.
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, session_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(AuthInner {
                identity,
                sessions: Mutex::new(HashMap::new()),
                session_ttl,
            }),
        }
    }

    /// Lifetime applied to newly issued sessions.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.inner.session_ttl
    }

    /// Verifies credentials and issues a session on success.
    ///
    /// Unknown names and wrong passwords are both `Ok(None)` so callers
    /// cannot distinguish them.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity lookup or hash verification fails.
    pub async fn login(
        &self,
        name: &str,
        password: &str,
    ) -> Result<Option<IssuedSession>, ApiError> {
        let Some(user) = self.inner.identity.resolve_by_request(name).await? else {
            return Ok(None);
        };
        if !verify_password(&user.password_hash, password)? {
            return Ok(None);
        }
        let token = self.issue_session(user.id);
        Ok(Some(IssuedSession { token, user }))
    }

    /// Resolves the account behind a session token, if the session is still
    /// live. Expired entries are dropped on the way out.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity lookup fails.
    pub async fn resolve_by_session(&self, token: &str) -> Result<Option<UserRow>, ApiError> {
        let user_id = {
            let mut sessions = self.lock_sessions();
            match sessions.get(token) {
                Some(entry) if entry.expires_at > Instant::now() => Some(entry.user_id),
                Some(_) => {
                    sessions.remove(token);
                    None
                }
                None => None,
            }
        };
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        self.inner.identity.resolve_by_identity(user_id).await
    }

    /// Resolves an account from request-carried credentials.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity lookup fails.
    pub async fn resolve_by_request(&self, name: &str) -> Result<Option<UserRow>, ApiError> {
        self.inner.identity.resolve_by_request(name).await
    }

    /// Revokes a session; returns whether a live entry was removed.
    #[must_use]
    pub fn logout(&self, token: &str) -> bool {
        self.lock_sessions().remove(token).is_some()
    }

    fn issue_session(&self, user_id: Uuid) -> String {
        let token = generate_token(SESSION_TOKEN_LEN);
        let expires_at = Instant::now() + self.inner.session_ttl;
        let mut sessions = self.lock_sessions();
        sessions.retain(|_, entry| entry.expires_at > Instant::now());
        sessions.insert(token.clone(), SessionEntry { user_id, expires_at });
        token
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.inner
            .sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Request guard for protected route groups.
///
/// Resolution order follows the login configuration: a session cookie is
/// tried first, then a `name` field on a form-encoded body. Requests that
/// resolve get [`CurrentUser`] attached; everything else is a 401.
pub(crate) async fn require_session(
    State(state): State<Arc<ApiState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(request.headers())
        && let Some(user) = state.auth.resolve_by_session(&token).await?
    {
        let mut request = request;
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }
    let (request, name) = buffer_form_name(request).await?;
    if let Some(name) = name
        && let Some(user) = state.auth.resolve_by_request(&name).await?
    {
        let mut request = request;
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }
    Err(ApiError::unauthorized(
        "a valid session or login name is required",
    ))
}

/// Extracts the session token from the request's cookie header.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// `Set-Cookie` value for a freshly issued session.
pub(crate) fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        ttl.as_secs()
    )
}

/// `Set-Cookie` value that clears the session cookie.
pub(crate) fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax")
}

/// Hashes a password for storage.
pub(crate) fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!(error = %err, "failed to hash password");
            ApiError::internal("failed to hash password")
        })
}

/// Checks a candidate password against its stored hash.
///
/// A mismatch is `Ok(false)`; only an undecodable hash is an error.
fn verify_password(stored: &str, candidate: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored).map_err(|err| {
        error!(error = %err, "stored password hash is malformed");
        ApiError::internal("stored credentials are malformed")
    })?;
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(err) => {
            error!(error = %err, "password verification failed");
            Err(ApiError::internal("password verification failed"))
        }
    }
}

fn generate_token(length: usize) -> String {
    let mut rng = rand::rng();
    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

fn form_field(body: &[u8], field: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(name, _)| name == field)
        .map(|(_, value)| value.into_owned())
}

/// Buffers a form-encoded body far enough to read the `name` field, then
/// rebuilds the request so downstream extractors still see the full body.
async fn buffer_form_name(request: Request) -> Result<(Request, Option<String>), ApiError> {
    if !is_form_encoded(request.headers()) {
        return Ok((request, None));
    }
    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, FORM_BODY_LIMIT).await.map_err(|err| {
        debug!(error = %err, "failed to buffer form body");
        ApiError::bad_request("request body could not be read")
    })?;
    let name = form_field(&bytes, "name");
    let request = Request::from_parts(parts, Body::from(bytes));
    Ok((request, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct StaticIdentity {
        user: UserRow,
    }

    #[async_trait]
    impl IdentityProvider for StaticIdentity {
        async fn resolve_by_identity(&self, id: Uuid) -> Result<Option<UserRow>, ApiError> {
            Ok((self.user.id == id).then(|| self.user.clone()))
        }

        async fn resolve_by_request(&self, name: &str) -> Result<Option<UserRow>, ApiError> {
            Ok((self.user.name == name).then(|| self.user.clone()))
        }
    }

    fn sample_user(password: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "ada".to_string(),
            email: None,
            password_hash: hash_password(password).unwrap(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        }
    }

    fn manager(user: UserRow, ttl: Duration) -> AuthManager {
        AuthManager::new(Arc::new(StaticIdentity { user }), ttl)
    }

    #[tokio::test]
    async fn login_checks_credentials_and_issues_sessions() {
        let user = sample_user("hunter2");
        let auth = manager(user.clone(), Duration::from_secs(60));

        assert!(auth.login("ada", "wrong").await.unwrap().is_none());
        assert!(auth.login("nobody", "hunter2").await.unwrap().is_none());

        let session = auth.login("ada", "hunter2").await.unwrap().unwrap();
        assert_eq!(session.user.id, user.id);
        assert_eq!(session.token.len(), SESSION_TOKEN_LEN);

        let resolved = auth
            .resolve_by_session(&session.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, user.id);

        assert!(auth.logout(&session.token));
        assert!(!auth.logout(&session.token));
        assert!(auth.resolve_by_session(&session.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_resolve_to_no_user() {
        let user = sample_user("hunter2");
        let auth = manager(user, Duration::ZERO);

        let session = auth.login("ada", "hunter2").await.unwrap().unwrap();
        assert!(auth.resolve_by_session(&session.token).await.unwrap().is_none());
    }

    #[test]
    fn cookie_helpers_round_trip() {
        let cookie = session_cookie("abc123", Duration::from_secs(3600));
        assert!(cookie.starts_with("SID=abc123;"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(clear_session_cookie().contains("Max-Age=0"));

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; SID=abc123".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));

        headers.insert(COOKIE, "theme=dark".parse().unwrap());
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn form_field_reads_urlencoded_names() {
        assert_eq!(
            form_field(b"name=ada&password=hunter2", "name").as_deref(),
            Some("ada")
        );
        assert_eq!(form_field(b"password=hunter2", "name"), None);
        assert_eq!(
            form_field(b"name=ada%20lovelace", "name").as_deref(),
            Some("ada lovelace")
        );
    }
}
