//! # Porseman Server
//!
//! The HTTP surface over the answering agent: `POST /chat` for end users
//! plus thin admin endpoints for curating the knowledge base.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

use crate::config::AppConfig;
use crate::router::create_router;
use crate::state::build_app_state;
use tracing::{debug, info};

/// Builds the application state and serves it on the given listener.
pub async fn run(listener: tokio::net::TcpListener, config: AppConfig) -> anyhow::Result<()> {
    debug!(?config, "Server configuration loaded");

    let app_state = build_app_state(config).await?;
    let app = create_router(app_state);

    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
