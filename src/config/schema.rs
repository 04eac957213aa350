//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the manager.
//! Every section has defaults so a minimal file only needs the JWT secret.
//! Durations accept integer nanoseconds or human strings (`"15m"`).

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::model::JsonDuration;

/// Root configuration for Flecto Manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// HTTP API listener.
    pub http: HttpConfig,

    /// Persistence backend.
    pub database: DatabaseConfig,

    /// Token signing and optional OpenID login.
    pub auth: AuthConfig,

    /// Static page size limits.
    pub page: PageConfig,

    /// Agent liveness classification.
    pub agent: AgentConfig,

    /// Prometheus exporter and agent gauge sampler.
    pub metrics: MetricsConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub listen_address: String,

    /// Deadline applied to every request.
    pub request_timeout: JsonDuration,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            request_timeout: JsonDuration::from_secs(2),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// On-disk redb file at `dsn`.
    Redb,
    /// Ephemeral in-memory database; `dsn` is ignored.
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub driver: DatabaseDriver,

    /// Path of the database file for the redb driver.
    pub dsn: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::Redb,
            dsn: "flecto.redb".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt: JwtConfig,

    /// Present only when OpenID login is enabled.
    pub openid: Option<OpenIdConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JwtConfig {
    /// HMAC secret, at least 32 bytes. No default.
    pub secret: String,

    pub access_ttl: JsonDuration,

    pub refresh_ttl: JsonDuration,

    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_ttl: JsonDuration::from_secs(15 * 60),
            refresh_ttl: JsonDuration::from_secs(7 * 24 * 3600),
            issuer: "flecto-manager".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenIdConfig {
    pub provider_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,

    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Claim carrying role names, if roles are mapped from the provider.
    #[serde(default)]
    pub roles_claim: Option<String>,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "profile".to_string(), "email".to_string()]
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PageConfig {
    /// Maximum size of one page in bytes.
    pub size_limit: u64,

    /// Maximum total size of a project's published pages in bytes.
    pub total_size_limit: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size_limit: 1024 * 1024,
            total_size_limit: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agents silent for longer than this are offline.
    pub offline_threshold: JsonDuration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            offline_threshold: JsonDuration::from_secs(5 * 60),
        }
    }
}

impl AgentConfig {
    pub fn offline_threshold_ms(&self) -> u64 {
        u64::try_from(self.offline_threshold.as_duration().as_millis()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the Prometheus endpoint and the agent sampler.
    pub enabled: bool,

    /// Prometheus endpoint bind address.
    pub listen_address: String,

    pub sample_interval: JsonDuration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_address: "0.0.0.0:9090".to_string(),
            sample_interval: JsonDuration::from_secs(30),
        }
    }
}

impl MetricsConfig {
    pub fn sample_interval(&self) -> Duration {
        self.sample_interval.as_duration()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable logs.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
