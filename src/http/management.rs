//! Draft editing, publishing and agent overview.
//!
//! Every endpoint requires write permission on the project. The draft
//! handlers are generic over the entity so redirects and pages share them.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::auth::authorize;
use super::server::AppState;
use crate::drafts::DraftValue;
use crate::error::Result;
use crate::model::{now_millis, Action, Agent, Draft, DraftInput, DraftView, Project, Token};

/// GET .../{redirect,page}-drafts
pub async fn list_drafts<E: DraftValue>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
) -> Result<Json<Vec<DraftView<E>>>> {
    authorize(&token, &namespace, &project, Action::Write)?;
    Ok(Json(state.journal.list::<E>(&namespace, &project)?))
}

/// POST .../{redirect,page}-drafts
pub async fn create_draft<E: DraftValue>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
    Json(input): Json<DraftInput<E>>,
) -> Result<(StatusCode, Json<Draft<E>>)> {
    authorize(&token, &namespace, &project, Action::Write)?;
    let draft = state.journal.insert(&namespace, &project, input)?;
    Ok((StatusCode::CREATED, Json(draft)))
}

/// GET .../{redirect,page}-drafts/{id}
pub async fn get_draft<E: DraftValue>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project, id)): Path<(String, String, u64)>,
) -> Result<Json<DraftView<E>>> {
    authorize(&token, &namespace, &project, Action::Write)?;
    Ok(Json(state.journal.get::<E>(&namespace, &project, id)?))
}

/// PATCH .../{redirect,page}-drafts/{id}
pub async fn update_draft<E: DraftValue>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project, id)): Path<(String, String, u64)>,
    Json(value): Json<E>,
) -> Result<Json<Draft<E>>> {
    authorize(&token, &namespace, &project, Action::Write)?;
    Ok(Json(state.journal.update(&namespace, &project, id, value)?))
}

/// DELETE .../{redirect,page}-drafts/{id}
pub async fn delete_draft<E: DraftValue>(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project, id)): Path<(String, String, u64)>,
) -> Result<StatusCode> {
    authorize(&token, &namespace, &project, Action::Write)?;
    state.journal.delete::<E>(&namespace, &project, id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST .../publish
pub async fn publish(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
) -> Result<Json<Project>> {
    authorize(&token, &namespace, &project, Action::Write)?;
    // A publish holds a redb write transaction for its whole run.
    let publisher = state.publisher.clone();
    let published =
        tokio::task::spawn_blocking(move || publisher.publish(&namespace, &project)).await??;
    Ok(Json(published))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    #[serde(flatten)]
    pub agent: Agent,
    pub online: bool,
}

/// GET .../agents
pub async fn list_agents(
    State(state): State<AppState>,
    Extension(token): Extension<Token>,
    Path((namespace, project)): Path<(String, String)>,
) -> Result<Json<Vec<AgentView>>> {
    authorize(&token, &namespace, &project, Action::Write)?;
    let now = now_millis();
    let agents = state
        .registry
        .list(&namespace, &project)?
        .into_iter()
        .map(|agent| AgentView {
            online: agent.is_online(now, state.offline_threshold_ms),
            agent,
        })
        .collect();
    Ok(Json(agents))
}
