// Session gate: extractors and activity middleware
// Decision: API routes answer 401 JSON; page routes redirect to /login
// Decision: The gate never creates sessions; only a login attempt does

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::SignedCookieJar;
use deskrelay_core::SessionUser;

use super::session_cookie::{session_cookie, session_id};
use crate::error::ApiError;
use crate::state::AppState;

/// Logged-in user behind an API request
#[derive(Debug, Clone)]
pub struct ApiUser {
    pub session_id: String,
    pub user: SessionUser,
}

/// Logged-in user behind a page request
#[derive(Debug, Clone)]
pub struct PageUser(pub ApiUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for ApiUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        current_user(parts, state).await?.ok_or(ApiError::Unauthorized)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for PageUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match current_user(parts, state).await {
            Ok(Some(user)) => Ok(PageUser(user)),
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(err) => Err(err.into_response()),
        }
    }
}

/// Resolve the signed session cookie to a logged-in user, if any
async fn current_user(parts: &Parts, state: &AppState) -> Result<Option<ApiUser>, ApiError> {
    let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
    let Some(id) = session_id(&jar, &state.config.cookie.name) else {
        return Ok(None);
    };

    let session = state.sessions.load(&id).await?;
    Ok(session.and_then(|session| {
        session.user.map(|user| ApiUser {
            session_id: session.id,
            user,
        })
    }))
}

/// Push sliding expiry forward on authenticated traffic and re-issue the cookie.
/// A no-op with fixed expiry.
pub async fn session_activity(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    request: Request,
    next: Next,
) -> Response {
    let touched = match session_id(&jar, &state.config.cookie.name) {
        Some(id) => match state.sessions.touch(&id).await {
            Ok(true) => Some(id),
            Ok(false) => None,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to refresh session expiry");
                None
            }
        },
        None => None,
    };

    let response = next.run(request).await;

    match touched {
        Some(id) => {
            let cookie = session_cookie(&state.config.cookie, id, state.sessions.config().ttl);
            (jar.add(cookie), response).into_response()
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{login_cookie, test_state};
    use axum::http::{Request, StatusCode};
    use axum::{body::Body, routing::get, Json, Router};
    use deskrelay_core::{SessionConfig, SessionExpiry};
    use tower::ServiceExt;

    async fn whoami(user: ApiUser) -> Json<String> {
        Json(user.user.display_name)
    }

    async fn page(PageUser(user): PageUser) -> String {
        user.user.username
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/page", get(page))
            .route_layer(axum::middleware::from_fn_with_state(state.clone(), session_activity))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_api_without_cookie_is_401() {
        let app = router(test_state(SessionConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_without_cookie_redirects() {
        let app = router(test_state(SessionConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");
    }

    #[tokio::test]
    async fn test_logged_in_cookie_is_accepted() {
        let state = test_state(SessionConfig::default());
        let cookie = login_cookie(&state, "alice", "Alice").await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/page")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("set-cookie").is_none());
    }

    #[tokio::test]
    async fn test_sliding_expiry_reissues_cookie() {
        let state = test_state(SessionConfig {
            ttl: chrono::Duration::minutes(30),
            expiry: SessionExpiry::Sliding,
        });
        let cookie = login_cookie(&state, "alice", "Alice").await;
        let app = router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("cookie", cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response.headers()["set-cookie"].to_str().unwrap();
        assert!(set_cookie.starts_with("deskrelay.sid="));
    }
}
