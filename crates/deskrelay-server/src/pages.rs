// HTML pages served from PUBLIC_DIR

use std::path::Path;

use anyhow::Context;
use axum::{extract::State, response::Html, routing::get, Router};

use crate::auth::PageUser;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/index", get(index_page))
        .route("/index.html", get(index_page))
        .with_state(state)
}

/// Main ticket viewer page; anonymous visitors are sent to /login
async fn index_page(
    _user: PageUser,
    State(state): State<AppState>,
) -> Result<Html<String>, ApiError> {
    serve_page(&state.config.public_dir, "index.html").await
}

pub async fn serve_page(public_dir: &Path, file: &str) -> Result<Html<String>, ApiError> {
    let path = public_dir.join(file);
    let html = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read page {}", path.display()))?;
    Ok(Html(html))
}
