//! Domain model shared by the manager and its agents.
//!
//! # Data Flow
//! ```text
//! admin writers ──▶ Draft<Redirect|Page> ──publish──▶ Record<Redirect|Page>
//!                                                      │
//!                     agents ◀──paginated JSON─────────┘
//!                        │
//!                        └──heartbeat──▶ Agent
//! ```
//!
//! # Design Decisions
//! - Every stringly-typed discriminator is a closed enum with an `Unknown`
//!   sentinel so that legacy payloads still deserialize
//! - Timestamps are milliseconds since the Unix epoch
//! - Entity ids are allocated by the store and never reused

pub mod agent;
pub mod draft;
pub mod duration;
pub mod page;
pub mod project;
pub mod redirect;
pub mod token;

pub use agent::{Agent, AgentHeartbeat, AgentStatus, AgentType};
pub use draft::{ChangeType, Draft, DraftInput, DraftView};
pub use duration::JsonDuration;
pub use page::{ContentType, Page, PageType};
pub use project::{Namespace, Project};
pub use redirect::{Redirect, RedirectStatus, RedirectType};
pub use token::{Action, ResourcePermission, Token};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as Timestamp
}

/// A value that lives in the published relation of a project and can be
/// staged as a draft (redirects and pages).
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Singular name used in logs and error messages.
    const KIND: &'static str;

    /// The string that must be unique per project (`source` or `path`).
    fn unique_key(&self) -> &str;

    /// Size accounted against the page quota.
    fn content_size(&self) -> u64 {
        0
    }
}

/// A row of the published relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<E> {
    pub id: u64,
    #[serde(flatten)]
    pub value: E,
    pub is_published: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
