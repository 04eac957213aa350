//! Keeps an in-memory match tree in step with the manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::client::{ClientError, ManagerClient};
use crate::matching::{PageTree, PatternError, RedirectTree};
use crate::model::{AgentHeartbeat, AgentStatus, AgentType, JsonDuration, Page, Record, Redirect};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Compile(#[from] PatternError),
}

/// Immutable match state for one published version.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// 0 until the first successful load.
    pub version: u64,
    pub redirects: RedirectTree,
    pub pages: PageTree,
}

impl Snapshot {
    pub fn compile(
        version: u64,
        redirects: Vec<Record<Redirect>>,
        pages: Vec<Record<Page>>,
    ) -> Result<Self, PatternError> {
        Ok(Self {
            version,
            redirects: RedirectTree::build(redirects.into_iter().map(|r| r.value))?,
            pages: PageTree::build(pages.into_iter().map(|r| r.value))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Version unchanged; only the heartbeat was sent.
    Unchanged,
    /// A new snapshot was swapped in.
    Updated(u64),
}

pub struct Syncer {
    client: ManagerClient,
    name: String,
    kind: AgentType,
    interval: Duration,
    current: ArcSwap<Snapshot>,
    registered: AtomicBool,
}

impl Syncer {
    pub fn new(client: ManagerClient, name: &str, kind: AgentType, interval: Duration) -> Self {
        Self {
            client,
            name: name.to_string(),
            kind,
            interval,
            current: ArcSwap::from_pointee(Snapshot::default()),
            registered: AtomicBool::new(false),
        }
    }

    /// The snapshot currently served. Never blocks.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Poll the manager once.
    ///
    /// On a version change the relations are downloaded, compiled and
    /// swapped in, and the outcome is reported through an agent upsert. A
    /// failed load keeps the previous snapshot and reports `ERROR`.
    pub async fn refresh(&self) -> Result<SyncOutcome, SyncError> {
        let version = self.client.version().await?;
        let current = self.current.load_full();

        if version == current.version && self.registered.load(Ordering::Acquire) {
            match self.client.hit(&self.name).await {
                Ok(()) => return Ok(SyncOutcome::Unchanged),
                Err(e) if e.is_not_found() => {
                    debug!(agent = %self.name, "agent unknown to manager, registering again");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let start = Instant::now();
        match self.load(version).await {
            Ok(snapshot) => {
                let rules = snapshot.redirects.len();
                let pages = snapshot.pages.len();
                self.current.store(Arc::new(snapshot));
                self.report(AgentStatus::Success, version, start.elapsed(), String::new())
                    .await?;
                info!(version, redirects = rules, pages, "match tree updated");
                Ok(SyncOutcome::Updated(version))
            }
            Err(e) => {
                warn!(version, error = %e, "match tree update failed");
                let served = current.version;
                self.report(AgentStatus::Error, served, start.elapsed(), e.to_string())
                    .await?;
                Err(e)
            }
        }
    }

    async fn load(&self, version: u64) -> Result<Snapshot, SyncError> {
        let redirects = self.client.redirects().await?;
        let pages = self.client.pages().await?;
        Ok(Snapshot::compile(version, redirects, pages)?)
    }

    async fn report(
        &self,
        status: AgentStatus,
        version: u64,
        load_duration: Duration,
        error: String,
    ) -> Result<(), ClientError> {
        let heartbeat = AgentHeartbeat {
            name: self.name.clone(),
            kind: Some(self.kind),
            status: Some(status),
            version,
            // A zero duration is rejected for new agents.
            load_duration: Some(JsonDuration::from(load_duration.max(Duration::from_nanos(1)))),
            error,
        };
        self.client.upsert_agent(&heartbeat).await?;
        self.registered.store(true, Ordering::Release);
        Ok(())
    }

    /// Refresh on every interval tick until `shutdown` fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(agent = %self.name, interval = ?self.interval, "syncer started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.refresh().await {
                        warn!(agent = %self.name, error = %e, "sync failed");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
        info!(agent = %self.name, "syncer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RedirectStatus, RedirectType};

    fn record(id: u64, redirect: Redirect) -> Record<Redirect> {
        Record {
            id,
            value: redirect,
            is_published: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_compile_snapshot() {
        let snapshot = Snapshot::compile(
            4,
            vec![record(
                1,
                Redirect::new(RedirectType::Regex, "/user/([0-9]+)", "/u/$1", RedirectStatus::Found),
            )],
            vec![],
        )
        .unwrap();
        assert_eq!(snapshot.version, 4);
        assert_eq!(snapshot.redirects.find("any", "/user/7").unwrap().target, "/u/7");
    }

    #[test]
    fn test_compile_rejects_bad_regex() {
        let result = Snapshot::compile(
            1,
            vec![record(
                1,
                Redirect::new(RedirectType::Regex, "/(", "/x", RedirectStatus::Found),
            )],
            vec![],
        );
        assert!(matches!(result, Err(PatternError::InvalidSource { .. })));
    }
}
