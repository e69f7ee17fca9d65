//! `api` crate — the thin HTTP boundary over the execution substrate.
//!
//! Per spec, the REST surface itself is an external collaborator; this
//! crate's job is only to translate HTTP requests into calls against
//! `dispatch::Services` and the `db` repositories, never to hold domain
//! logic of its own.
//!
//! Exposes:
//!   GET    /api/v1/workflows
//!   POST   /api/v1/workflows
//!   GET    /api/v1/workflows/:id
//!   DELETE /api/v1/workflows/:id
//!   POST   /api/v1/workflows/:id/execute
//!   POST   /webhook/:path
//!   POST   /internal/callback

pub mod convert;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use dispatch::Services;
use engine::NodeCatalog;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub catalog: Arc<NodeCatalog>,
}

pub async fn serve(bind: &str, services: Arc<Services>, catalog: Arc<NodeCatalog>) -> Result<(), std::io::Error> {
    let state = AppState { services, catalog };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_router = Router::new()
        .route("/workflows", get(handlers::workflows::list).post(handlers::workflows::create))
        .route("/workflows/:id", get(handlers::workflows::get).delete(handlers::workflows::delete))
        .route("/workflows/:id/execute", post(handlers::executions::execute));

    let app = Router::new()
        .nest("/api/v1", api_router)
        .route("/webhook/:path", post(handlers::webhooks::handle_webhook))
        .route("/internal/callback", post(handlers::callbacks::handle_callback))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}
