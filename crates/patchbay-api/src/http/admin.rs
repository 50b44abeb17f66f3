//! Administration endpoints: accounts and login sessions.

use std::sync::Arc;

use axum::{
    Extension, Form, Json, Router,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{debug, error};

use patchbay_data::users::{self, NewUser};

use crate::http::auth::{
    CurrentUser, clear_session_cookie, hash_password, require_session, session_cookie,
    session_token,
};
use crate::http::errors::{ApiError, map_data_error};
use crate::models::{CreateUserRequest, LoginRequest, SessionView, UserView};
use crate::state::ApiState;

const DEFAULT_ROLE: &str = "user";

/// Routes for the `admin` namespace.
///
/// Login and account creation stay open so a fresh install can bootstrap its
/// first user; everything else requires a session.
pub(crate) fn routes(state: &Arc<ApiState>) -> Router<Arc<ApiState>> {
    let open = Router::new()
        .route("/login", post(login))
        .route("/users", post(create_user));
    let guarded = Router::new()
        .route("/users", get(list_users))
        .route("/logout", post(logout))
        .route("/whoami", get(whoami))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));
    open.merge(guarded)
}

pub(crate) async fn login(
    State(state): State<Arc<ApiState>>,
    Form(request): Form<LoginRequest>,
) -> Result<Response, ApiError> {
    let Some(session) = state.auth.login(&request.name, &request.password).await? else {
        return Err(ApiError::unauthorized("unknown name or wrong password"));
    };
    state.telemetry.inc_session_issued();
    let cookie: HeaderValue = session_cookie(&session.token, state.auth.session_ttl())
        .parse()
        .map_err(|err| {
            error!(error = %err, "failed to encode session cookie");
            ApiError::internal("failed to encode session cookie")
        })?;
    let mut response = Json(SessionView {
        user: UserView::from(session.user),
    })
    .into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

pub(crate) async fn logout(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers)
        && !state.auth.logout(&token)
    {
        debug!("logout for a session that was already gone");
    }
    let cookie: HeaderValue = clear_session_cookie().parse().map_err(|err| {
        error!(error = %err, "failed to encode session cookie");
        ApiError::internal("failed to encode session cookie")
    })?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(SET_COOKIE, cookie);
    Ok(response)
}

pub(crate) async fn whoami(Extension(current): Extension<CurrentUser>) -> Json<UserView> {
    Json(UserView::from(current.0))
}

pub(crate) async fn create_user(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    if request.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }
    let password_hash = hash_password(&request.password)?;
    let user = NewUser {
        name,
        email: request.email.as_deref(),
        password_hash: &password_hash,
        role: request.role.as_deref().unwrap_or(DEFAULT_ROLE),
    };
    let row = users::insert_user(state.store.pool(), &user)
        .await
        .map_err(|err| map_data_error(&err, "insert_user"))?;
    Ok((StatusCode::CREATED, Json(UserView::from(row))))
}

pub(crate) async fn list_users(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let rows = users::list_users(state.store.pool())
        .await
        .map_err(|err| map_data_error(&err, "list_users"))?;
    Ok(Json(rows.into_iter().map(UserView::from).collect()))
}
