use axum::{
    Router,
    routing::{get, patch, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::auth::{self, TokenIssuer};
use crate::api::journal;
use crate::config::Config;
use crate::db::repo;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub async fn from_config(config: &Config) -> Result<Self, repo::StoreError> {
        let db = repo::connect(&config.database_url).await?;
        let tokens = TokenIssuer::new(&config.jwt_secret(), config.token_ttl_secs);
        Ok(Self { db, tokens })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/journal", post(journal::create))
        .route("/journal/user/{id}", get(journal::journals_for_user))
        .route(
            "/journal/{id}",
            get(journal::journal).patch(journal::update_journal),
        )
        .route("/journal/{id}/entry", post(journal::add_entry))
        .route("/journal/{id}/entries", get(journal::entries))
        .route("/journal/{id}/entry/{entry_id}", get(journal::entry))
        .route("/entry/{id}", patch(journal::update_entry))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the API on an already bound listener until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(Arc::new(state))).await
}

pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config).await?;

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "journal server listening");

    serve(listener, state).await?;
    Ok(())
}
