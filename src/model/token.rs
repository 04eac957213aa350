//! API tokens and their resource permissions.

use serde::{Deserialize, Serialize};

use super::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

/// Grants read and/or write on one project, or on every project of a
/// namespace when `project` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcePermission {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

impl ResourcePermission {
    fn covers(&self, namespace: &str, project: &str) -> bool {
        self.namespace == namespace && self.project.as_deref().map_or(true, |p| p == project)
    }

    fn grants(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read || self.write,
            Action::Write => self.write,
        }
    }
}

/// A stored token. The secret itself is never persisted, only `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub hash: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub permissions: Vec<ResourcePermission>,
    pub created_at: Timestamp,
}

impl Token {
    pub fn allows(&self, namespace: &str, project: &str, action: Action) -> bool {
        self.admin
            || self
                .permissions
                .iter()
                .any(|p| p.covers(namespace, project) && p.grants(action))
    }
}
