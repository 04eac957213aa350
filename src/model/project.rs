use serde::{Deserialize, Serialize};

use super::Timestamp;

/// Top-level scope. `code` is the stable identifier used in keys and URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Namespace {
    pub code: String,
    pub name: String,
    pub created_at: Timestamp,
}

/// A project inside a namespace. `version` is the cursor agents poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub namespace_code: String,
    pub project_code: String,
    pub name: String,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Project {
    /// Version of a freshly created project.
    pub const INITIAL_VERSION: u64 = 1;

    pub fn new(namespace_code: &str, project_code: &str, name: &str, now: Timestamp) -> Self {
        Self {
            namespace_code: namespace_code.to_string(),
            project_code: project_code.to_string(),
            name: name.to_string(),
            version: Self::INITIAL_VERSION,
            published_at: None,
            created_at: now,
        }
    }
}

/// Validate a namespace code, project code or agent name.
///
/// Codes end up inside composite storage keys and URL segments, so they are
/// restricted to `[a-zA-Z0-9_-]+`.
pub fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_charset() {
        assert!(is_valid_code("shop-eu_1"));
        assert!(!is_valid_code(""));
        assert!(!is_valid_code("a/b"));
        assert!(!is_valid_code("é"));
        assert!(!is_valid_code("with space"));
    }

    #[test]
    fn test_new_project_starts_at_version_one() {
        let project = Project::new("ns", "proj", "Project", 10);
        assert_eq!(project.version, 1);
        assert!(project.published_at.is_none());
    }
}
