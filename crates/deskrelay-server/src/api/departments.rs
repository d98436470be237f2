// Department list and gateway display info

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::helpdesk::ProviderResponse;
use crate::state::AppState;

/// Display info for the ticket viewer header
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoResponse {
    #[schema(example = "Billing")]
    pub department_name: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/departments", get(list_departments))
        .with_state(state)
}

/// GET /departments - Provider departments
#[utoipa::path(
    get,
    path = "/departments",
    responses(
        (status = 200, description = "Provider department list, relayed unchanged"),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "departments"
)]
pub async fn list_departments(
    _auth: ApiUser,
    State(state): State<AppState>,
) -> Result<ProviderResponse, ApiError> {
    Ok(state.helpdesk.list_departments().await?)
}

/// GET /app-info - Configured department name (public)
#[utoipa::path(
    get,
    path = "/app-info",
    responses(
        (status = 200, description = "Gateway display info", body = AppInfoResponse)
    ),
    tag = "departments"
)]
pub async fn app_info(State(state): State<AppState>) -> Json<AppInfoResponse> {
    Json(AppInfoResponse {
        department_name: state.config.department_name.clone(),
    })
}
