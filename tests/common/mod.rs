//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

use flecto_manager::config::{DatabaseDriver, ManagerConfig};
use flecto_manager::http::{build_router, AppState, HttpServer};
use flecto_manager::lifecycle::Shutdown;
use flecto_manager::model::ResourcePermission;
use flecto_manager::store::Store;

pub const NS: &str = "shop";
pub const PROJ: &str = "web";

pub struct TestApp {
    pub store: Store,
    pub config: ManagerConfig,
    pub state: AppState,
    pub router: Router,
    /// Token with write access on `NS/PROJ`.
    pub editor: String,
    /// Token with read access on `NS/PROJ`.
    pub reader: String,
}

pub fn test_config() -> ManagerConfig {
    let mut config = ManagerConfig::default();
    config.database.driver = DatabaseDriver::Memory;
    config.page.size_limit = 64;
    config.page.total_size_limit = 100;
    config
}

/// In-memory store with one project and two tokens.
pub fn test_app() -> TestApp {
    let config = test_config();
    let store = Store::open_in_memory().unwrap();
    store.create_namespace(NS, "Shop", 1).unwrap();
    store.create_project(NS, PROJ, "Website", 1).unwrap();

    let (editor, _) = store
        .create_token("editor", false, vec![permission(true)], 1)
        .unwrap();
    let (reader, _) = store
        .create_token("reader", false, vec![permission(false)], 1)
        .unwrap();

    let state = AppState::new(store.clone(), &config);
    let router = build_router(state.clone(), &config.http);
    TestApp {
        store,
        config,
        state,
        router,
        editor,
        reader,
    }
}

fn permission(write: bool) -> ResourcePermission {
    ResourcePermission {
        namespace: NS.to_string(),
        project: Some(PROJ.to_string()),
        read: true,
        write,
    }
}

pub fn project_path(suffix: &str) -> String {
    format!("/api/namespace/{NS}/project/{PROJ}{suffix}")
}

/// Drive one request through the router. Empty bodies come back as `Null`.
pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Serve the app on an ephemeral port until the returned handle is triggered.
pub async fn spawn_server(app: &TestApp) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app.state.clone(), &app.config.http);
    let signal = shutdown.clone();
    tokio::spawn(async move { server.run(listener, signal).await });
    (addr, shutdown)
}
