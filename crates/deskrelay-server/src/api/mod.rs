// Helpdesk-facing API routes
//
// Every route except /app-info requires a logged-in session and relays the
// provider's JSON body unchanged.

pub mod departments;
pub mod messages;
pub mod tickets;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Routes that need no session and never touch one
pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/app-info", get(departments::app_info))
        .with_state(state)
}

/// Session-protected pass-through routes
pub fn protected_routes(state: AppState) -> Router {
    Router::new()
        .merge(tickets::routes(state.clone()))
        .merge(messages::routes(state.clone()))
        .merge(departments::routes(state))
}
