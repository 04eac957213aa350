//! redb table definitions and key layout.
//!
//! Every table maps `&str` keys to JSON-serialised rows. Keys are built from
//! codes restricted to `[a-zA-Z0-9_-]`, so `/` is a safe separator and a
//! `{ns}/{proj}/` prefix never captures a sibling project.

use redb::TableDefinition;

pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Namespaces keyed by `{ns}`.
pub const NAMESPACES: JsonTable = TableDefinition::new("namespaces");

/// Projects keyed by `{ns}/{proj}`.
pub const PROJECTS: JsonTable = TableDefinition::new("projects");

/// Published redirects keyed by `{ns}/{proj}/{id:020}`.
pub const REDIRECTS: JsonTable = TableDefinition::new("redirects");

/// Redirect drafts keyed by `{ns}/{proj}/{id:020}`.
pub const REDIRECT_DRAFTS: JsonTable = TableDefinition::new("redirect_drafts");

/// Published pages keyed by `{ns}/{proj}/{id:020}`.
pub const PAGES: JsonTable = TableDefinition::new("pages");

/// Page drafts keyed by `{ns}/{proj}/{id:020}`.
pub const PAGE_DRAFTS: JsonTable = TableDefinition::new("page_drafts");

/// Agents keyed by `{ns}/{proj}/{name}`.
pub const AGENTS: JsonTable = TableDefinition::new("agents");

/// Tokens keyed by the hex SHA-256 of the secret.
pub const TOKENS: JsonTable = TableDefinition::new("tokens");

/// Id counters keyed by table name.
pub const SEQUENCES: TableDefinition<'static, &'static str, u64> =
    TableDefinition::new("sequences");

/// Tables holding per-project children, cleared on project deletion.
pub const PROJECT_CHILDREN: [JsonTable; 5] =
    [REDIRECTS, REDIRECT_DRAFTS, PAGES, PAGE_DRAFTS, AGENTS];

pub fn project_key(namespace: &str, project: &str) -> String {
    format!("{namespace}/{project}")
}

/// Prefix of every row a namespace owns in `PROJECTS` and child tables.
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{namespace}/")
}

/// Prefix of every row a project owns in its child tables.
pub fn project_prefix(namespace: &str, project: &str) -> String {
    format!("{namespace}/{project}/")
}

/// Ids are zero padded so that lexicographic key order is id order.
pub fn entity_key(namespace: &str, project: &str, id: u64) -> String {
    format!("{namespace}/{project}/{id:020}")
}

pub fn agent_key(namespace: &str, project: &str, name: &str) -> String {
    format!("{namespace}/{project}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_keys_sort_by_id() {
        let nine = entity_key("ns", "p", 9);
        let ten = entity_key("ns", "p", 10);
        assert!(nine < ten);
        assert!(ten.starts_with(&project_prefix("ns", "p")));
    }

    #[test]
    fn test_project_prefix_excludes_siblings() {
        let sibling = entity_key("ns", "proj2", 1);
        assert!(!sibling.starts_with(&project_prefix("ns", "proj")));
    }
}
