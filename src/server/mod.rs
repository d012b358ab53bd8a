//! HTTP API over the agent system.

pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::{AgentSystem, ThreadStore};
use crate::config::{AgentsConfig, DEFAULT_AGENT_TIMEOUT};
use crate::error::AgentsError;

pub use error::ApiError;
pub use routes::{AppState, ApiMessage};

impl AppState {
    pub fn new(system: Option<Arc<dyn AgentSystem>>) -> Self {
        Self {
            system,
            threads: ThreadStore::new(),
            agent_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    pub fn with_agent_timeout(mut self, agent_timeout: Duration) -> Self {
        self.agent_timeout = agent_timeout;
        self
    }
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/status", get(routes::status))
        .route("/chat", axum::routing::post(routes::chat))
        .route(
            "/conversation/:thread_id",
            get(routes::get_conversation).delete(routes::clear_conversation),
        )
        .route("/conversations", get(routes::list_conversations))
        .fallback(routes::not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind to the configured address and serve until the process exits.
pub async fn serve(config: &AgentsConfig, system: Arc<dyn AgentSystem>) -> Result<(), AgentsError> {
    let addr = config.bind_addr()?;
    let state = Arc::new(AppState::new(Some(system)).with_agent_timeout(config.agent_timeout));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Starting API server");
    axum::serve(listener, app).await?;
    Ok(())
}
