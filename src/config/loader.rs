//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ManagerConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_HTTP_LISTEN_ADDRESS: &str = "FLECTO_HTTP_LISTEN_ADDRESS";
pub const ENV_DATABASE_DSN: &str = "FLECTO_DATABASE_DSN";
pub const ENV_JWT_SECRET: &str = "FLECTO_JWT_SECRET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load, override from the environment, and validate a TOML config file.
pub fn load_config(path: &Path) -> Result<ManagerConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parse and validate config text. `env` resolves override variables.
pub fn parse_config<F>(content: &str, env: F) -> Result<ManagerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: ManagerConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, env);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

pub fn apply_env_overrides<F>(config: &mut ManagerConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(address) = env(ENV_HTTP_LISTEN_ADDRESS) {
        config.http.listen_address = address;
    }
    if let Some(dsn) = env(ENV_DATABASE_DSN) {
        config.database.dsn = dsn;
    }
    if let Some(secret) = env(ENV_JWT_SECRET) {
        config.auth.jwt.secret = secret;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DatabaseDriver;
    use std::time::Duration;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_full_file() {
        let text = format!(
            r#"
            [http]
            listen_address = "127.0.0.1:8088"
            request_timeout = "5s"

            [database]
            driver = "memory"

            [auth.jwt]
            secret = "{SECRET}"
            access_ttl = "30m"
            refresh_ttl = "72h"

            [page]
            size_limit = 1024
            total_size_limit = 4096

            [agent]
            offline_threshold = 90000000000

            [metrics]
            sample_interval = "10s"
            "#
        );
        let config = parse_config(&text, no_env).unwrap();
        assert_eq!(config.http.listen_address, "127.0.0.1:8088");
        assert_eq!(config.http.request_timeout.as_duration(), Duration::from_secs(5));
        assert_eq!(config.database.driver, DatabaseDriver::Memory);
        assert_eq!(config.auth.jwt.refresh_ttl.as_duration(), Duration::from_secs(72 * 3600));
        assert_eq!(config.page.total_size_limit, 4096);
        assert_eq!(config.agent.offline_threshold_ms(), 90_000);
        assert_eq!(config.metrics.sample_interval(), Duration::from_secs(10));
        assert!(config.auth.openid.is_none());
    }

    #[test]
    fn test_env_overrides_apply_before_validation() {
        let env = |key: &str| match key {
            ENV_JWT_SECRET => Some(SECRET.to_string()),
            ENV_DATABASE_DSN => Some("/var/lib/flecto/db.redb".to_string()),
            _ => None,
        };
        let config = parse_config("", env).unwrap();
        assert_eq!(config.auth.jwt.secret, SECRET);
        assert_eq!(config.database.dsn, "/var/lib/flecto/db.redb");
    }

    #[test]
    fn test_validation_errors_surface() {
        let err = parse_config("[page]\nsize_limit = 10\ntotal_size_limit = 5\n", no_env)
            .unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["auth.jwt.secret", "page.total_size_limit"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_example_file_is_valid() {
        let config = parse_config(include_str!("../../flecto.example.toml"), no_env).unwrap();
        assert_eq!(config.database.driver, DatabaseDriver::Redb);
        assert_eq!(config.agent.offline_threshold_ms(), 300_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flecto.toml");
        std::fs::write(&path, format!("[auth.jwt]\nsecret = \"{SECRET}\"\n")).unwrap();
        // Only passes when the process environment carries no overrides.
        if std::env::var(ENV_JWT_SECRET).is_err() {
            let config = load_config(&path).unwrap();
            assert_eq!(config.auth.jwt.secret, SECRET);
        }
        assert!(matches!(
            load_config(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
