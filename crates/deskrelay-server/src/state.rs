// Shared application state

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use deskrelay_core::{SessionStore, UserDirectory};

use crate::auth::session_cookie::derive_cookie_key;
use crate::config::GatewayConfig;
use crate::helpdesk::HelpdeskClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub sessions: SessionStore,
    pub users: Arc<UserDirectory>,
    pub helpdesk: HelpdeskClient,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        config: GatewayConfig,
        sessions: SessionStore,
        users: UserDirectory,
        helpdesk: HelpdeskClient,
    ) -> Self {
        let cookie_key = derive_cookie_key(&config.session_secret);
        Self {
            config: Arc::new(config),
            sessions,
            users: Arc::new(users),
            helpdesk,
            cookie_key,
        }
    }
}

// SignedCookieJar pulls its key from here
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
