// Deskrelay gateway server

use anyhow::{Context, Result};
use deskrelay_core::{SessionBackend, SessionStore, UserDirectory};
use deskrelay_server::{build_router, spawn_session_purger, AppState, GatewayConfig, HelpdeskClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "deskrelay_server=debug,deskrelay_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("deskrelay starting...");

    let config = GatewayConfig::from_env().context("Invalid configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    let users = UserDirectory::load(&config.users_file)
        .with_context(|| format!("Failed to load users from {}", config.users_file.display()))?;
    if users.is_empty() {
        tracing::warn!(path = %config.users_file.display(), "No users configured; nobody can log in");
    } else {
        tracing::info!(count = users.len(), "Users loaded");
    }

    let backend = match &config.session_database_url {
        Some(url) => SessionBackend::postgres(url)
            .await
            .context("Failed to initialize PostgreSQL session store")?,
        None => {
            tracing::info!("SESSION_DATABASE_URL not set, keeping sessions in memory");
            SessionBackend::in_memory()
        }
    };
    let sessions = SessionStore::new(backend, config.session);
    tracing::info!(
        backend = sessions.backend_name(),
        expiry = ?config.session.expiry,
        "Session store ready"
    );

    let helpdesk = HelpdeskClient::new(&config.helpdesk).context("Failed to build helpdesk client")?;
    tracing::info!(base_url = %helpdesk.base_url(), "Helpdesk client configured");

    spawn_session_purger(sessions.clone(), config.session_purge_interval);

    let port = config.port;
    let state = AppState::new(config, sessions, users, helpdesk);
    let app = build_router(state);

    // Start HTTP server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
