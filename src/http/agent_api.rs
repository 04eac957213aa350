//! Endpoints polled by agents.
//!
//! All of them require read permission on the project.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use super::auth::authorize;
use super::pagination::{PageQuery, Paginated};
use super::server::AppState;
use crate::error::Result;
use crate::model::{Action, AgentHeartbeat, Page, Record, Redirect, Token};
use crate::store::StoredEntity;

/// GET /api/namespace/{ns}/project/{proj}/version
pub async fn get_version(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
) -> Result<Json<u64>> {
    authorize(&token, &namespace, &project, Action::Read)?;
    Ok(Json(state.store.project_version(&namespace, &project)?))
}

/// GET /api/namespace/{ns}/project/{proj}/redirects
pub async fn list_redirects(
    state: State<AppState>,
    token: Extension<Token>,
    path: Path<(String, String)>,
    query: Query<PageQuery>,
) -> Result<Json<Paginated<Record<Redirect>>>> {
    list_published::<Redirect>(state, token, path, query)
}

/// GET /api/namespace/{ns}/project/{proj}/pages
pub async fn list_pages(
    state: State<AppState>,
    token: Extension<Token>,
    path: Path<(String, String)>,
    query: Query<PageQuery>,
) -> Result<Json<Paginated<Record<Page>>>> {
    list_published::<Page>(state, token, path, query)
}

fn list_published<E: StoredEntity>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Record<E>>>> {
    authorize(&token, &namespace, &project, Action::Read)?;
    let (limit, offset) = query.resolve();
    let listing = state
        .store
        .list_published::<E>(&namespace, &project, limit, offset)?;
    Ok(Json(Paginated::new(listing, limit, offset)))
}

/// POST /api/namespace/{ns}/project/{proj}/agents
pub async fn upsert_agent(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
    Json(heartbeat): Json<AgentHeartbeat>,
) -> Result<StatusCode> {
    authorize(&token, &namespace, &project, Action::Read)?;
    state.registry.upsert(&namespace, &project, heartbeat)?;
    Ok(StatusCode::OK)
}

/// PATCH /api/namespace/{ns}/project/{proj}/agents/{name}/hit
pub async fn hit_agent(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project, name)): Path<(String, String, String)>,
) -> Result<StatusCode> {
    authorize(&token, &namespace, &project, Action::Read)?;
    state.registry.update_last_hit(&namespace, &project, &name)?;
    Ok(StatusCode::OK)
}
