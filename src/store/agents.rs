use super::codec::{put_json, TableRead};
use super::tables::*;
use crate::error::Result;
use crate::model::Agent;

pub fn agent<T: TableRead>(txn: &T, namespace: &str, project: &str, name: &str) -> Result<Option<Agent>> {
    Ok(txn.get_json(AGENTS, &agent_key(namespace, project, name))?)
}

pub fn project_agents<T: TableRead>(txn: &T, namespace: &str, project: &str) -> Result<Vec<Agent>> {
    Ok(txn.scan_json(AGENTS, &project_prefix(namespace, project))?)
}

pub fn all_agents<T: TableRead>(txn: &T) -> Result<Vec<Agent>> {
    Ok(txn.scan_json(AGENTS, "")?)
}

pub fn put_agent(txn: &redb::WriteTransaction, agent: &Agent) -> Result<()> {
    let key = agent_key(&agent.namespace_code, &agent.project_code, &agent.name);
    put_json(txn, AGENTS, &key, agent)?;
    Ok(())
}
