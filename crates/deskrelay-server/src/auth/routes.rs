// Login, logout and identity routes
// Decision: The session cookie is attached to every /do-login response, failures included,
// so a browser's failed attempts keep landing on the same throttle state
// Decision: Throttle check happens before the payload is even looked at; a blocked session never reaches Argon2
// Decision: A successful login moves the session to a fresh id, keeping its throttle state

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::SignedCookieJar;
use chrono::Utc;
use deskrelay_core::{CredentialAttempt, Session, VerifyOutcome};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::middleware::ApiUser;
use super::session_cookie::{removal_cookie, session_cookie, session_id};
use crate::error::{ApiError, StatusBody};
use crate::pages::serve_page;
use crate::state::AppState;

/// Login form submission
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    #[schema(format = Password)]
    pub password: String,
}

/// Identity of the logged-in agent
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserInfoResponse {
    pub username: String,
    /// Display name, used to sign outgoing messages
    pub name: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/login", get(login_page))
        .route("/do-login", post(do_login))
        .route("/logout", get(logout))
        .route("/user-info", get(user_info))
        .with_state(state)
}

/// GET /login - Login page
async fn login_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    serve_page(&state.config.public_dir, "login.html").await
}

/// POST /do-login - Submit credentials
#[utoipa::path(
    post,
    path = "/do-login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = StatusBody),
        (status = 400, description = "Missing username or password", body = StatusBody),
        (status = 401, description = "Invalid username or password", body = StatusBody),
        (status = 429, description = "Too many attempts from this session", body = StatusBody),
        (status = 500, description = "Internal server error", body = StatusBody)
    ),
    tag = "auth"
)]
pub async fn do_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let cookie_id = session_id(&jar, &state.config.cookie.name);
    let (session, created) = match state.sessions.get_or_create(cookie_id.as_deref()).await {
        Ok(found) => found,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let jar = if created {
        jar.add(session_cookie(
            &state.config.cookie,
            session.id.clone(),
            session.expires_at - Utc::now(),
        ))
    } else {
        jar
    };

    match attempt_login(&state, &session.id, payload).await {
        Ok(session) => {
            let jar = jar.add(session_cookie(
                &state.config.cookie,
                session.id.clone(),
                session.expires_at - Utc::now(),
            ));
            (jar, Json(StatusBody::ok("Login successful"))).into_response()
        }
        Err(err) => (jar, err).into_response(),
    }
}

async fn attempt_login(
    state: &AppState,
    session_id: &str,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Session, ApiError> {
    let throttle = state.config.throttle;
    let retry_after = state
        .sessions
        .update(session_id, |session| {
            let now = Utc::now();
            session.throttle.record_attempt(now, &throttle);
            session.throttle.retry_after(now, &throttle)
        })
        .await?
        .ok_or_else(|| anyhow!("session expired during login"))?;

    if let Some(wait) = retry_after {
        let retry_after_secs = ((wait.num_milliseconds() + 999) / 1000).max(1) as u64;
        tracing::warn!(retry_after_secs, "Login throttled");
        return Err(ApiError::TooManyAttempts { retry_after_secs });
    }

    let Json(request) = payload?;
    if request.username.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let username = request.username.clone();
    let users = state.users.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        users.verify(&CredentialAttempt {
            username: &request.username,
            password: &request.password,
        })
    })
    .await
    .map_err(|e| anyhow!("credential check failed: {}", e))?;

    let VerifyOutcome::Match(user) = outcome else {
        tracing::info!(username = %username, "Login failed");
        return Err(ApiError::InvalidCredentials);
    };

    let session = state
        .sessions
        .rotate(session_id, |session| session.log_in(user))
        .await?
        .ok_or_else(|| anyhow!("session expired during login"))?;

    tracing::info!(username = %username, "Login succeeded");
    Ok(session)
}

/// GET /logout - Destroy the session and go back to the login page
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session destroyed; redirect to /login")
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    if let Some(id) = session_id(&jar, &state.config.cookie.name) {
        if let Err(err) = state.sessions.destroy(&id).await {
            return ApiError::from(err).into_response();
        }
        tracing::debug!("Session destroyed");
    }

    let jar = jar.remove(removal_cookie(&state.config.cookie));
    (jar, Redirect::to("/login")).into_response()
}

/// GET /user-info - Identity of the logged-in agent
#[utoipa::path(
    get,
    path = "/user-info",
    responses(
        (status = 200, description = "Logged-in agent", body = UserInfoResponse),
        (status = 401, description = "Unauthorized", body = StatusBody)
    ),
    tag = "auth"
)]
pub async fn user_info(auth: ApiUser) -> Json<UserInfoResponse> {
    Json(UserInfoResponse {
        username: auth.user.username,
        name: auth.user.display_name,
    })
}
