// Session-based authentication for the gateway
//
// - session_cookie: signed cookie carrying the session id
// - middleware: ApiUser / PageUser extractors and sliding-expiry refresh
// - routes: login page, /do-login, /logout, /user-info

pub mod middleware;
pub mod routes;
pub mod session_cookie;

pub use middleware::{session_activity, ApiUser, PageUser};
