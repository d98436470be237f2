// Ticket (chat) pass-through routes

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::helpdesk::ProviderResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TicketsQuery {
    /// Department to filter chats by
    #[serde(rename = "departmentId")]
    pub department_id: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/tickets", get(list_tickets))
        .route("/department-tickets", get(list_department_tickets))
        .route("/ticket/:id", get(get_ticket))
        .with_state(state)
}

/// GET /tickets - Newest chats of a given department
#[utoipa::path(
    get,
    path = "/tickets",
    params(TicketsQuery),
    responses(
        (status = 200, description = "Provider chat search result, relayed unchanged"),
        (status = 400, description = "departmentId missing", body = crate::error::StatusBody),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    _auth: ApiUser,
    State(state): State<AppState>,
    query: Result<Query<TicketsQuery>, QueryRejection>,
) -> Result<ProviderResponse, ApiError> {
    let Query(query) = query?;
    let department_id = query
        .department_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("departmentId is required".to_string()))?;

    Ok(state.helpdesk.search_chats(&department_id).await?)
}

/// GET /department-tickets - Newest chats of the configured department
#[utoipa::path(
    get,
    path = "/department-tickets",
    responses(
        (status = 200, description = "Provider chat search result, relayed unchanged"),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "tickets"
)]
pub async fn list_department_tickets(
    _auth: ApiUser,
    State(state): State<AppState>,
) -> Result<ProviderResponse, ApiError> {
    Ok(state
        .helpdesk
        .search_chats(&state.config.department_id)
        .await?)
}

/// GET /ticket/:id - Single chat
#[utoipa::path(
    get,
    path = "/ticket/{id}",
    params(("id" = u64, Path, description = "Chat ID")),
    responses(
        (status = 200, description = "Provider chat, relayed unchanged"),
        (status = 400, description = "Invalid chat id", body = crate::error::StatusBody),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    _auth: ApiUser,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<ProviderResponse, ApiError> {
    let Path(id) = id?;
    Ok(state.helpdesk.get_chat(id).await?)
}
