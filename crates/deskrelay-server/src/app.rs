// Router assembly and background tasks

use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Json, Router,
};
use deskrelay_core::SessionStore;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{self, session_activity};
use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::{api, pages};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub session_store: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        session_store: state.sessions.backend_name().to_string(),
    })
}

/// Full gateway router: pages, auth, pass-through API, health and docs
pub fn build_router(state: AppState) -> Router {
    // Sliding expiry is refreshed only by traffic that needs a session
    let protected = Router::new()
        .merge(pages::routes(state.clone()))
        .merge(api::protected_routes(state.clone()))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_activity,
        ));

    let cors_origins: Vec<HeaderValue> = state
        .config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let app = Router::new()
        .route("/health", get(health).with_state(state.clone()))
        .merge(auth::routes::routes(state.clone()))
        .merge(api::public_routes(state))
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
        app
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                .allow_credentials(true),
        )
    };

    app.layer(TraceLayer::new_for_http())
}

/// Periodically drop expired sessions so the store doesn't grow without bound
pub fn spawn_session_purger(
    sessions: SessionStore,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Purged expired sessions"),
                Err(err) => tracing::warn!(error = %err, "Failed to purge expired sessions"),
            }
        }
    })
}
