//! Pending changes against the published relation.

use serde::{Deserialize, Serialize};

use super::{Record, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Unknown,
}

impl ChangeType {
    /// Position in the publish sequence. CREATE runs first, DELETE last.
    pub fn apply_order(self) -> u8 {
        match self {
            ChangeType::Create => 0,
            ChangeType::Update => 1,
            ChangeType::Delete => 2,
            ChangeType::Unknown => 3,
        }
    }
}

/// One staged change. `old_id` points into the published relation of the
/// same project; `new_value` is absent for DELETE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft<E> {
    pub id: u64,
    pub change_type: ChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_id: Option<u64>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub new_value: Option<E>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl<E> Draft<E> {
    /// True when this draft claims `new_value`'s source or path.
    pub fn claims_value(&self) -> bool {
        self.change_type != ChangeType::Delete && self.new_value.is_some()
    }

    /// The published row this draft replaces or removes. CREATE never
    /// shadows a published row, whatever `old_id` holds.
    pub fn replaces(&self) -> Option<u64> {
        match self.change_type {
            ChangeType::Update | ChangeType::Delete => self.old_id,
            ChangeType::Create | ChangeType::Unknown => None,
        }
    }
}

/// Request body for staging a change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput<E> {
    pub change_type: ChangeType,
    #[serde(default)]
    pub old_id: Option<u64>,
    #[serde(default = "Option::default")]
    pub value: Option<E>,
}

impl<E> DraftInput<E> {
    pub fn create(value: E) -> Self {
        Self {
            change_type: ChangeType::Create,
            old_id: None,
            value: Some(value),
        }
    }

    pub fn update(old_id: u64, value: E) -> Self {
        Self {
            change_type: ChangeType::Update,
            old_id: Some(old_id),
            value: Some(value),
        }
    }

    pub fn delete(old_id: u64) -> Self {
        Self {
            change_type: ChangeType::Delete,
            old_id: Some(old_id),
            value: None,
        }
    }
}

/// A draft with the published row it replaces, for diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView<E> {
    #[serde(flatten)]
    pub draft: Draft<E>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub old: Option<Record<E>>,
}
