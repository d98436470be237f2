// Chat message routes
// Decision: Outgoing text is signed with the agent's display name before it reaches the provider
// Decision: All messages are sent as the single configured provider agent (HC_AGENT_ID)

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::ApiUser;
use crate::error::ApiError;
use crate::helpdesk::{signed_text, MessageKind, OutgoingMessage, ProviderResponse};
use crate::state::AppState;

/// Reply typed by an agent in the ticket viewer
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    #[schema(example = "Thanks, we're looking into it.")]
    pub text: String,
    /// Post as an internal note instead of a customer-visible reply
    #[serde(default)]
    pub is_private: bool,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chats/:id/messages", get(list_messages))
        .route("/chats/:id/sendMessage", post(send_message))
        .with_state(state)
}

/// GET /chats/:id/messages - Messages of a chat
#[utoipa::path(
    get,
    path = "/chats/{id}/messages",
    params(("id" = u64, Path, description = "Chat ID")),
    responses(
        (status = 200, description = "Provider message list, relayed unchanged"),
        (status = 400, description = "Invalid chat id", body = crate::error::StatusBody),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "messages"
)]
pub async fn list_messages(
    _auth: ApiUser,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<ProviderResponse, ApiError> {
    let Path(id) = id?;
    Ok(state.helpdesk.list_messages(id).await?)
}

/// POST /chats/:id/sendMessage - Reply to a chat as the logged-in agent
#[utoipa::path(
    post,
    path = "/chats/{id}/sendMessage",
    params(("id" = u64, Path, description = "Chat ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Provider response, relayed unchanged"),
        (status = 400, description = "Empty text or invalid chat id", body = crate::error::StatusBody),
        (status = 401, description = "Unauthorized", body = crate::error::StatusBody),
        (status = 500, description = "Provider error", body = crate::error::StatusBody),
        (status = 503, description = "Provider unreachable", body = crate::error::StatusBody)
    ),
    tag = "messages"
)]
pub async fn send_message(
    auth: ApiUser,
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<ProviderResponse, ApiError> {
    let Path(chat) = id?;
    let Json(request) = payload?;

    if request.text.trim().is_empty() {
        return Err(ApiError::Validation("Message text is required".to_string()));
    }

    let message = OutgoingMessage {
        text: signed_text(&request.text, &auth.user.display_name),
        chat,
        agent: state.config.helpdesk.agent_id,
        kind: MessageKind::from_private_flag(request.is_private),
    };

    tracing::info!(
        chat,
        username = %auth.user.username,
        kind = ?message.kind,
        "Sending message"
    );

    Ok(state.helpdesk.send_message(&message).await?)
}
