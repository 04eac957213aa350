//! Sidecar agents and their heartbeats.

use serde::{Deserialize, Serialize};

use super::{JsonDuration, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

/// The proxy an agent runs next to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentType {
    Default,
    Traefik,
    Caddy,
    Nginx,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub namespace_code: String,
    pub project_code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub status: AgentStatus,
    /// Last project version the agent synchronised.
    pub version: u64,
    pub load_duration: JsonDuration,
    #[serde(default)]
    pub error: String,
    pub last_hit_at: Timestamp,
    pub created_at: Timestamp,
}

impl Agent {
    /// Online means a heartbeat arrived within `offline_threshold_ms` of `now`.
    pub fn is_online(&self, now: Timestamp, offline_threshold_ms: u64) -> bool {
        self.last_hit_at > now.saturating_sub(offline_threshold_ms)
    }
}

/// Body of `POST .../agents`.
///
/// `type`, `status` and `loadDuration` are mandatory when the agent is new;
/// for a known agent, absent values keep what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentHeartbeat {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AgentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AgentStatus>,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_duration: Option<JsonDuration>,
    #[serde(default)]
    pub error: String,
}
