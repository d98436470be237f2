// OpenAPI specification for the gateway's browser-facing API

use crate::api;
use crate::auth;
use crate::error::StatusBody;
use utoipa::OpenApi;

/// OpenAPI documentation for the Deskrelay gateway
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::do_login,
        auth::routes::logout,
        auth::routes::user_info,
        api::tickets::list_tickets,
        api::tickets::list_department_tickets,
        api::tickets::get_ticket,
        api::messages::list_messages,
        api::messages::send_message,
        api::departments::list_departments,
        api::departments::app_info,
    ),
    components(
        schemas(
            StatusBody,
            auth::routes::LoginRequest,
            auth::routes::UserInfoResponse,
            api::messages::SendMessageRequest,
            api::departments::AppInfoResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login, logout and session identity"),
        (name = "tickets", description = "Helpdesk chat search and lookup"),
        (name = "messages", description = "Chat messages and replies"),
        (name = "departments", description = "Departments and display info")
    ),
    info(
        title = "Deskrelay API",
        description = "Session-authenticated gateway in front of a helpdesk provider",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;
