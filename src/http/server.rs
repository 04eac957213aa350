//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the agent and management endpoints
//! - Wire up middleware (tracing, limits, request ID, auth, metrics)
//! - Serve on a listener until the shutdown signal fires

use std::time::Instant;

use axum::extract::{DefaultBodyLimit, MatchedPath, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::{agent_api, auth, management};
use crate::agents::AgentRegistry;
use crate::config::{HttpConfig, ManagerConfig};
use crate::drafts::DraftJournal;
use crate::lifecycle::Shutdown;
use crate::model::{Page, Redirect};
use crate::observability::metrics;
use crate::publish::{PageLimits, Publisher};
use crate::store::Store;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub journal: DraftJournal,
    pub publisher: Publisher,
    pub registry: AgentRegistry,
    pub offline_threshold_ms: u64,
}

impl AppState {
    pub fn new(store: Store, config: &ManagerConfig) -> Self {
        let limits = PageLimits::from(&config.page);
        Self {
            journal: DraftJournal::new(store.clone(), limits),
            publisher: Publisher::new(store.clone(), limits),
            registry: AgentRegistry::new(store.clone()),
            offline_threshold_ms: config.agent.offline_threshold_ms(),
            store,
        }
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    let project_routes = Router::new()
        .route("/version", get(agent_api::get_version))
        .route("/redirects", get(agent_api::list_redirects))
        .route("/pages", get(agent_api::list_pages))
        .route(
            "/agents",
            get(management::list_agents).post(agent_api::upsert_agent),
        )
        .route("/agents/{name}/hit", patch(agent_api::hit_agent))
        .route(
            "/redirect-drafts",
            get(management::list_drafts::<Redirect>).post(management::create_draft::<Redirect>),
        )
        .route(
            "/redirect-drafts/{id}",
            get(management::get_draft::<Redirect>)
                .patch(management::update_draft::<Redirect>)
                .delete(management::delete_draft::<Redirect>),
        )
        .route(
            "/page-drafts",
            get(management::list_drafts::<Page>).post(management::create_draft::<Page>),
        )
        .route(
            "/page-drafts/{id}",
            get(management::get_draft::<Page>)
                .patch(management::update_draft::<Page>)
                .delete(management::delete_draft::<Page>),
        )
        .route("/publish", post(management::publish))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_token));

    Router::new()
        .nest("/api/namespace/{namespace}/project/{project}", project_routes)
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(RequestBodyLimitLayer::new(config.max_body_size))
                .layer(TimeoutLayer::new(config.request_timeout.as_duration())),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);
    tracing::debug!(method = %method, path = %path, status, "request handled");
    response
}

/// HTTP server for the management and agent APIs.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &HttpConfig) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
