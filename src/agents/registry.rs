//! Agent registry: upsert, heartbeat and status counts.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{now_millis, Agent, AgentHeartbeat, AgentStatus, Timestamp};
use crate::store::agents::{agent, all_agents, project_agents, put_agent};
use crate::store::projects::load_project;
use crate::store::Store;

static AGENT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("agent name pattern compiles"));

#[derive(Clone)]
pub struct AgentRegistry {
    store: Store,
}

impl AgentRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn upsert(&self, namespace: &str, project: &str, heartbeat: AgentHeartbeat) -> Result<Agent> {
        self.upsert_at(namespace, project, heartbeat, now_millis())
    }

    /// Register the agent or refresh its reported state.
    ///
    /// A new agent must report `status`, `type` and a non-zero
    /// `loadDuration`. A known agent keeps its stored `status`, `type` and
    /// `loadDuration` where the heartbeat omits them.
    pub fn upsert_at(
        &self,
        namespace: &str,
        project: &str,
        heartbeat: AgentHeartbeat,
        now: Timestamp,
    ) -> Result<Agent> {
        check_name(&heartbeat.name)?;

        let txn = self.store.begin_write()?;
        load_project(&txn, namespace, project)?;

        let record = match agent(&txn, namespace, project, &heartbeat.name)? {
            Some(mut existing) => {
                if let Some(status) = heartbeat.status {
                    existing.status = status;
                }
                if let Some(kind) = heartbeat.kind {
                    existing.kind = kind;
                }
                if let Some(load_duration) = heartbeat.load_duration {
                    existing.load_duration = load_duration;
                }
                existing.version = heartbeat.version;
                existing.error = heartbeat.error;
                existing.last_hit_at = now;
                existing
            }
            None => {
                let status = heartbeat.status.ok_or(Error::MissingField("status"))?;
                let kind = heartbeat.kind.ok_or(Error::MissingField("type"))?;
                let load_duration = heartbeat
                    .load_duration
                    .filter(|d| !d.is_zero())
                    .ok_or(Error::MissingField("loadDuration"))?;
                info!(
                    namespace = %namespace,
                    project = %project,
                    agent = %heartbeat.name,
                    "agent registered"
                );
                Agent {
                    namespace_code: namespace.to_string(),
                    project_code: project.to_string(),
                    name: heartbeat.name,
                    kind,
                    status,
                    version: heartbeat.version,
                    load_duration,
                    error: heartbeat.error,
                    last_hit_at: now,
                    created_at: now,
                }
            }
        };

        put_agent(&txn, &record)?;
        self.store.commit(txn)?;
        debug!(
            namespace = %namespace,
            project = %project,
            agent = %record.name,
            status = ?record.status,
            version = record.version,
            "agent upserted"
        );
        Ok(record)
    }

    pub fn update_last_hit(&self, namespace: &str, project: &str, name: &str) -> Result<Agent> {
        self.update_last_hit_at(namespace, project, name, now_millis())
    }

    /// Touch `lastHitAt`; every other field is written back unchanged.
    pub fn update_last_hit_at(
        &self,
        namespace: &str,
        project: &str,
        name: &str,
        now: Timestamp,
    ) -> Result<Agent> {
        let txn = self.store.begin_write()?;
        let mut record = agent(&txn, namespace, project, name)?
            .ok_or_else(|| Error::not_found(format!("agent {name}")))?;
        record.last_hit_at = now;
        put_agent(&txn, &record)?;
        self.store.commit(txn)?;
        Ok(record)
    }

    /// Agents of the project with `status` whose last heartbeat is at or
    /// after `since`.
    pub fn count_by_project_and_status(
        &self,
        namespace: &str,
        project: &str,
        status: AgentStatus,
        since: Timestamp,
    ) -> Result<u64> {
        let txn = self.store.begin_read()?;
        let count = project_agents(&txn, namespace, project)?
            .iter()
            .filter(|a| a.status == status && a.last_hit_at >= since)
            .count();
        Ok(count as u64)
    }

    pub fn list(&self, namespace: &str, project: &str) -> Result<Vec<Agent>> {
        let txn = self.store.begin_read()?;
        load_project(&txn, namespace, project)?;
        project_agents(&txn, namespace, project)
    }

    pub fn list_all(&self) -> Result<Vec<Agent>> {
        let txn = self.store.begin_read()?;
        all_agents(&txn)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::MissingField("name"));
    }
    if !AGENT_NAME.is_match(name) {
        return Err(Error::BadRequest(format!(
            "agent name {name:?} may only contain letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgentType, JsonDuration};

    fn registry() -> AgentRegistry {
        let store = Store::open_in_memory().unwrap();
        store.create_namespace("ns", "Namespace", 1).unwrap();
        store.create_project("ns", "proj", "Project", 1).unwrap();
        AgentRegistry::new(store)
    }

    fn heartbeat(name: &str, status: AgentStatus) -> AgentHeartbeat {
        AgentHeartbeat {
            name: name.to_string(),
            kind: Some(AgentType::Traefik),
            status: Some(status),
            version: 2,
            load_duration: Some(JsonDuration::from_millis(40)),
            error: String::new(),
        }
    }

    #[test]
    fn test_new_agent_requires_fields() {
        let registry = registry();

        let mut missing_status = heartbeat("edge", AgentStatus::Success);
        missing_status.status = None;
        assert!(matches!(
            registry.upsert_at("ns", "proj", missing_status, 10),
            Err(Error::MissingField("status"))
        ));

        let mut missing_type = heartbeat("edge", AgentStatus::Success);
        missing_type.kind = None;
        assert!(matches!(
            registry.upsert_at("ns", "proj", missing_type, 10),
            Err(Error::MissingField("type"))
        ));

        let mut zero_duration = heartbeat("edge", AgentStatus::Success);
        zero_duration.load_duration = Some(JsonDuration::from_millis(0));
        assert!(matches!(
            registry.upsert_at("ns", "proj", zero_duration, 10),
            Err(Error::MissingField("loadDuration"))
        ));

        assert!(matches!(
            registry.upsert_at("ns", "proj", heartbeat("", AgentStatus::Success), 10),
            Err(Error::MissingField("name"))
        ));
        assert!(matches!(
            registry.upsert_at("ns", "ghost", heartbeat("edge", AgentStatus::Success), 10),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_agent_name_charset() {
        let registry = registry();
        let accepted = registry
            .upsert_at("ns", "proj", heartbeat("Edge_01-b", AgentStatus::Success), 10)
            .unwrap();
        assert_eq!(accepted.name, "Edge_01-b");

        for name in ["edge 1", "edge.1", "ágent", "a:b", "a/b"] {
            assert!(
                matches!(
                    registry.upsert_at("ns", "proj", heartbeat(name, AgentStatus::Success), 10),
                    Err(Error::BadRequest(_))
                ),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(registry.list("ns", "proj").unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_existing_keeps_omitted_fields() {
        let registry = registry();
        let created = registry
            .upsert_at("ns", "proj", heartbeat("edge", AgentStatus::Success), 10)
            .unwrap();
        assert_eq!(created.created_at, 10);

        let update = AgentHeartbeat {
            name: "edge".into(),
            status: Some(AgentStatus::Error),
            version: 3,
            error: "bad regex".into(),
            ..Default::default()
        };
        let updated = registry.upsert_at("ns", "proj", update, 20).unwrap();
        assert_eq!(updated.status, AgentStatus::Error);
        assert_eq!(updated.kind, AgentType::Traefik);
        assert_eq!(updated.load_duration, JsonDuration::from_millis(40));
        assert_eq!(updated.version, 3);
        assert_eq!(updated.error, "bad regex");
        assert_eq!(updated.last_hit_at, 20);
        assert_eq!(updated.created_at, 10);
    }

    #[test]
    fn test_hit_only_touches_last_hit() {
        let registry = registry();
        let before = registry
            .upsert_at("ns", "proj", heartbeat("edge", AgentStatus::Error), 10)
            .unwrap();
        let after = registry.update_last_hit_at("ns", "proj", "edge", 99).unwrap();

        assert_eq!(after.last_hit_at, 99);
        assert_eq!(Agent { last_hit_at: before.last_hit_at, ..after }, before);
        assert!(matches!(
            registry.update_last_hit_at("ns", "proj", "ghost", 99),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_count_by_status_since() {
        let registry = registry();
        registry
            .upsert_at("ns", "proj", heartbeat("a", AgentStatus::Success), 100)
            .unwrap();
        registry
            .upsert_at("ns", "proj", heartbeat("b", AgentStatus::Success), 50)
            .unwrap();
        registry
            .upsert_at("ns", "proj", heartbeat("c", AgentStatus::Error), 100)
            .unwrap();

        let count = |status, since| {
            registry
                .count_by_project_and_status("ns", "proj", status, since)
                .unwrap()
        };
        assert_eq!(count(AgentStatus::Success, 0), 2);
        assert_eq!(count(AgentStatus::Success, 100), 1);
        assert_eq!(count(AgentStatus::Error, 100), 1);
        assert_eq!(count(AgentStatus::Error, 101), 0);
        assert_eq!(registry.list("ns", "proj").unwrap().len(), 3);
        assert_eq!(registry.list_all().unwrap().len(), 3);
    }
}
