//! Periodic agent gauge sampler.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::{now_millis, Agent, AgentStatus, Timestamp};
use crate::observability::metrics;
use crate::store::agents::all_agents;
use crate::store::Store;

/// Gauge values for one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentCounts {
    pub online: u64,
    pub errors: u64,
}

/// Result of one tick, keyed by `(namespace, project)`.
///
/// Projects without an online agent are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSample {
    pub taken_at: Timestamp,
    pub projects: BTreeMap<(String, String), AgentCounts>,
}

impl AgentSample {
    pub fn get(&self, namespace: &str, project: &str) -> Option<AgentCounts> {
        self.projects
            .get(&(namespace.to_string(), project.to_string()))
            .copied()
    }
}

/// Group agents heard from after `since` by project and status.
pub fn sample_agents(agents: &[Agent], since: Timestamp, taken_at: Timestamp) -> AgentSample {
    let mut projects: BTreeMap<(String, String), AgentCounts> = BTreeMap::new();
    for agent in agents.iter().filter(|a| a.last_hit_at > since) {
        let counts = projects
            .entry((agent.namespace_code.clone(), agent.project_code.clone()))
            .or_default();
        counts.online += 1;
        if agent.status == AgentStatus::Error {
            counts.errors += 1;
        }
    }
    AgentSample { taken_at, projects }
}

pub struct MetricsSampler {
    store: Store,
    offline_threshold_ms: u64,
    interval: Duration,
    last: ArcSwap<AgentSample>,
}

impl MetricsSampler {
    pub fn new(store: Store, offline_threshold_ms: u64, interval: Duration) -> Self {
        Self {
            store,
            offline_threshold_ms,
            interval,
            last: ArcSwap::from_pointee(AgentSample::default()),
        }
    }

    /// The most recent sample.
    pub fn last(&self) -> Arc<AgentSample> {
        self.last.load_full()
    }

    /// Sample every project and replace the previous sample wholesale.
    ///
    /// Projects present in the previous sample but not in this one have
    /// both gauges reset to zero; the exporter's idle timeout then drops
    /// the series.
    pub fn tick_at(&self, now: Timestamp) -> Result<Arc<AgentSample>> {
        let since = now.saturating_sub(self.offline_threshold_ms);
        let agents = {
            let txn = self.store.begin_read()?;
            all_agents(&txn)?
        };
        let sample = Arc::new(sample_agents(&agents, since, now));

        let previous = self.last.swap(Arc::clone(&sample));
        for (namespace, project) in previous.projects.keys() {
            if !sample.projects.contains_key(&(namespace.clone(), project.clone())) {
                metrics::set_agents_online(namespace, project, 0);
                metrics::set_agents_errors(namespace, project, 0);
            }
        }
        for ((namespace, project), counts) in &sample.projects {
            metrics::set_agents_online(namespace, project, counts.online);
            metrics::set_agents_errors(namespace, project, counts.errors);
        }
        debug!(projects = sample.projects.len(), "agent gauges sampled");
        Ok(sample)
    }

    /// Tick until `shutdown` fires. The signal is only observed between ticks.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.interval, "agent sampler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick_at(now_millis()) {
                        warn!(error = %e, "agent sampling failed");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
        info!("agent sampler stopped");
    }
}
