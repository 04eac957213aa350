//! Redirect rules.

use serde::{Deserialize, Serialize};

use super::Entity;

/// How a redirect's `source` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectType {
    /// Literal absolute path (`/old`).
    Basic,
    /// Literal `host[:port]/path`.
    BasicHost,
    /// Regex matched against the request path.
    Regex,
    /// Regex matched against `host + path`.
    RegexHost,
    /// Unrecognised wire value; rejected by validation, never matched.
    #[serde(other)]
    Unknown,
}

impl RedirectType {
    pub fn is_regex(self) -> bool {
        matches!(self, RedirectType::Regex | RedirectType::RegexHost)
    }

    pub fn is_host_scoped(self) -> bool {
        matches!(self, RedirectType::BasicHost | RedirectType::RegexHost)
    }
}

/// HTTP status used when the redirect fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectStatus {
    MovedPermanent,
    Found,
    Temporary,
    Permanent,
    /// Unrecognised wire value; served as 302.
    #[serde(other)]
    Unknown,
}

impl RedirectStatus {
    /// HTTP status code for this redirect.
    pub fn http_code(self) -> u16 {
        match self {
            RedirectStatus::MovedPermanent => 301,
            RedirectStatus::Found => 302,
            RedirectStatus::Temporary => 307,
            RedirectStatus::Permanent => 308,
            RedirectStatus::Unknown => 302,
        }
    }
}

/// A redirect rule as staged in drafts and stored in the published relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    #[serde(rename = "type")]
    pub kind: RedirectType,
    pub source: String,
    pub target: String,
    pub status: RedirectStatus,
}

impl Redirect {
    pub fn new(
        kind: RedirectType,
        source: impl Into<String>,
        target: impl Into<String>,
        status: RedirectStatus,
    ) -> Self {
        Self {
            kind,
            source: source.into(),
            target: target.into(),
            status,
        }
    }
}

impl Entity for Redirect {
    const KIND: &'static str = "redirect";

    fn unique_key(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let redirect = Redirect::new(
            RedirectType::BasicHost,
            "example.com/old",
            "/new",
            RedirectStatus::MovedPermanent,
        );
        let json = serde_json::to_value(&redirect).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "BASIC_HOST",
                "source": "example.com/old",
                "target": "/new",
                "status": "MOVED_PERMANENT",
            })
        );
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let redirect: Redirect = serde_json::from_str(
            r#"{"type":"WILDCARD","source":"/a","target":"/b","status":"TEAPOT"}"#,
        )
        .unwrap();
        assert_eq!(redirect.kind, RedirectType::Unknown);
        assert_eq!(redirect.status, RedirectStatus::Unknown);
        assert_eq!(redirect.status.http_code(), 302);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RedirectStatus::MovedPermanent.http_code(), 301);
        assert_eq!(RedirectStatus::Found.http_code(), 302);
        assert_eq!(RedirectStatus::Temporary.http_code(), 307);
        assert_eq!(RedirectStatus::Permanent.http_code(), 308);
    }
}
