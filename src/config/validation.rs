//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs, thresholds, size limits)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::{DatabaseDriver, ManagerConfig, OpenIdConfig};

pub const MIN_JWT_SECRET_LEN: usize = 32;
pub const MIN_ACCESS_TTL: Duration = Duration::from_secs(60);
pub const MIN_REFRESH_TTL: Duration = Duration::from_secs(3600);
pub const MIN_OFFLINE_THRESHOLD: Duration = Duration::from_secs(1);
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(ValidationError { field, message });
    };

    if config.http.listen_address.parse::<SocketAddr>().is_err() {
        fail(
            "http.listen_address",
            format!("{:?} is not a socket address", config.http.listen_address),
        );
    }
    if config.http.request_timeout.is_zero() {
        fail("http.request_timeout", "must be positive".to_string());
    }
    if config.http.max_body_size == 0 {
        fail("http.max_body_size", "must be positive".to_string());
    }

    if config.database.driver == DatabaseDriver::Redb && config.database.dsn.trim().is_empty() {
        fail("database.dsn", "required for the redb driver".to_string());
    }

    let jwt = &config.auth.jwt;
    if jwt.secret.len() < MIN_JWT_SECRET_LEN {
        fail(
            "auth.jwt.secret",
            format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
        );
    }
    if jwt.access_ttl.as_duration() < MIN_ACCESS_TTL {
        fail("auth.jwt.access_ttl", "must be at least 1m".to_string());
    }
    if jwt.refresh_ttl.as_duration() < MIN_REFRESH_TTL {
        fail("auth.jwt.refresh_ttl", "must be at least 1h".to_string());
    }
    if jwt.issuer.trim().is_empty() {
        fail("auth.jwt.issuer", "required".to_string());
    }

    if let Some(openid) = &config.auth.openid {
        validate_openid(openid, &mut fail);
    }

    if config.page.size_limit == 0 {
        fail("page.size_limit", "must be positive".to_string());
    }
    if config.page.total_size_limit <= config.page.size_limit {
        fail(
            "page.total_size_limit",
            format!(
                "must be greater than page.size_limit ({})",
                config.page.size_limit
            ),
        );
    }

    if config.agent.offline_threshold.as_duration() < MIN_OFFLINE_THRESHOLD {
        fail("agent.offline_threshold", "must be at least 1s".to_string());
    }

    if config.metrics.enabled {
        if config.metrics.listen_address.parse::<SocketAddr>().is_err() {
            fail(
                "metrics.listen_address",
                format!("{:?} is not a socket address", config.metrics.listen_address),
            );
        }
        if config.metrics.sample_interval() < MIN_SAMPLE_INTERVAL {
            fail("metrics.sample_interval", "must be at least 1s".to_string());
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        fail(
            "observability.log_level",
            format!("must be one of {}", LOG_LEVELS.join(", ")),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_openid(openid: &OpenIdConfig, fail: &mut impl FnMut(&'static str, String)) {
    if url::Url::parse(&openid.provider_url).is_err() {
        fail("auth.openid.provider_url", "must be an absolute URL".to_string());
    }
    if openid.client_id.trim().is_empty() {
        fail("auth.openid.client_id", "required".to_string());
    }
    if openid.client_secret.trim().is_empty() {
        fail("auth.openid.client_secret", "required".to_string());
    }
    if url::Url::parse(&openid.redirect_url).is_err() {
        fail("auth.openid.redirect_url", "must be an absolute URL".to_string());
    }
}
