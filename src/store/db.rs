//! `Store`: the redb database plus the project lock table.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableDatabase, WriteTransaction};
use tracing::debug;

use super::error::{map_err, StoreError, StoreResult};
use super::locks::ProjectLocks;
use super::tables::*;
use crate::config::schema::{DatabaseConfig, DatabaseDriver};

/// Thread-safe handle to the manager's database. Cloning is cheap.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    locks: ProjectLocks,
}

impl Store {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!(?path, "store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self::from_database(db)?;
        debug!("in-memory store opened");
        Ok(store)
    }

    pub fn from_config(config: &DatabaseConfig) -> StoreResult<Self> {
        match config.driver {
            DatabaseDriver::Redb => {
                if config.dsn.is_empty() {
                    return Err(StoreError::Open("database.dsn is empty".to_string()));
                }
                Self::open(Path::new(&config.dsn))
            }
            DatabaseDriver::Memory => Self::open_in_memory(),
        }
    }

    fn from_database(db: Database) -> StoreResult<Self> {
        let store = Self {
            db: Arc::new(db),
            locks: ProjectLocks::new(),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    fn ensure_tables(&self) -> StoreResult<()> {
        let txn = self.begin_write()?;
        for table in [NAMESPACES, PROJECTS, TOKENS].into_iter().chain(PROJECT_CHILDREN) {
            txn.open_table(table).map_err(map_err!(Table))?;
        }
        txn.open_table(SEQUENCES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    pub fn begin_read(&self) -> StoreResult<ReadTransaction> {
        self.db.begin_read().map_err(map_err!(Transaction))
    }

    /// Start a write transaction. Dropping it without [`commit`] rolls back.
    ///
    /// [`commit`]: Store::commit
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        self.db.begin_write().map_err(map_err!(Transaction))
    }

    pub fn commit(&self, txn: WriteTransaction) -> StoreResult<()> {
        txn.commit().map_err(map_err!(Transaction))
    }

    /// Per-project publish locks.
    pub fn locks(&self) -> &ProjectLocks {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Namespace, Project};

    #[test]
    fn test_on_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flecto.redb");

        {
            let store = Store::open(&path).unwrap();
            store.create_namespace("ns", "Namespace", 1).unwrap();
            store.create_project("ns", "proj", "Project", 1).unwrap();
        }

        let store = Store::open(&path).unwrap();
        let namespaces: Vec<Namespace> = store.list_namespaces().unwrap();
        assert_eq!(namespaces.len(), 1);
        let project: Project = store.get_project("ns", "proj").unwrap().unwrap();
        assert_eq!(project.version, 1);
    }

    #[test]
    fn test_memory_driver_from_config() {
        let config = DatabaseConfig {
            driver: DatabaseDriver::Memory,
            dsn: String::new(),
        };
        let store = Store::from_config(&config).unwrap();
        assert!(store.list_namespaces().unwrap().is_empty());
    }
}
