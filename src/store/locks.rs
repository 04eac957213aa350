//! Per-project exclusive locks with no-wait acquisition.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::error::{StoreError, StoreResult};
use super::tables::project_key;

#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    held: Arc<DashMap<String, ()>>,
}

/// Releases the project lock when dropped.
#[derive(Debug)]
pub struct ProjectLockGuard {
    held: Arc<DashMap<String, ()>>,
    key: String,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock or fail immediately with [`StoreError::Locked`].
    pub fn try_lock(&self, namespace: &str, project: &str) -> StoreResult<ProjectLockGuard> {
        let key = project_key(namespace, project);
        match self.held.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Locked(format!("project {key} is locked"))),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(ProjectLockGuard {
                    held: Arc::clone(&self.held),
                    key,
                })
            }
        }
    }

    pub fn is_locked(&self, namespace: &str, project: &str) -> bool {
        self.held.contains_key(&project_key(namespace, project))
    }
}

impl Drop for ProjectLockGuard {
    fn drop(&mut self) {
        self.held.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_until_release() {
        let locks = ProjectLocks::new();
        let guard = locks.try_lock("ns", "proj").unwrap();

        let err = locks.try_lock("ns", "proj").unwrap_err();
        assert!(err.is_lock_contention());
        assert!(locks.try_lock("ns", "other").is_ok());

        drop(guard);
        assert!(!locks.is_locked("ns", "proj"));
        assert!(locks.try_lock("ns", "proj").is_ok());
    }
}
