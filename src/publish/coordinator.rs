//! Publish: promote every pending draft of a project in one transaction.

use std::collections::HashSet;

use redb::WriteTransaction;
use tracing::{info, warn};

use crate::drafts::DraftValue;
use crate::error::{Error, Result};
use crate::model::{now_millis, ChangeType, Draft, Page, Project, Record, Redirect, Timestamp};
use crate::observability::metrics;
use crate::publish::quota::{projected_total_size, PageLimits};
use crate::store::codec::{put_json, remove_key};
use crate::store::entities::{drafts, next_published_id, published, published_by_id};
use crate::store::projects::{load_project, save_project};
use crate::store::tables::entity_key;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct Publisher {
    store: Store,
    limits: PageLimits,
}

impl Publisher {
    pub fn new(store: Store, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// Publish all drafts of `namespace/project`, returning the project at
    /// its new version.
    ///
    /// Fails with [`Error::PublishInProgress`] when another publish holds the
    /// project. Any failure leaves drafts, published rows and the version
    /// untouched.
    pub fn publish(&self, namespace: &str, project: &str) -> Result<Project> {
        let result = self.publish_at(namespace, project, now_millis());
        match &result {
            Ok(published) => {
                metrics::record_publish("success");
                info!(
                    namespace = %namespace,
                    project = %project,
                    version = published.version,
                    "project published"
                );
            }
            Err(e) => {
                metrics::record_publish(e.kind());
                warn!(namespace = %namespace, project = %project, error = %e, "publish failed");
            }
        }
        result
    }

    fn publish_at(&self, namespace: &str, project: &str, now: Timestamp) -> Result<Project> {
        let _guard = self
            .store
            .locks()
            .try_lock(namespace, project)
            .map_err(lock_error)?;

        // Dropping `txn` on any early return rolls back everything below.
        let txn = self.store.begin_write()?;
        let mut target = load_project(&txn, namespace, project)?;

        let redirect_drafts = drafts::<Redirect, _>(&txn, namespace, project)?;
        let page_drafts = drafts::<Page, _>(&txn, namespace, project)?;
        if redirect_drafts.is_empty() && page_drafts.is_empty() {
            return Err(Error::NothingToPublish);
        }

        let pages = published::<Page, _>(&txn, namespace, project)?;
        self.limits
            .check_total(projected_total_size(&pages, &page_drafts))?;

        apply_drafts(&txn, namespace, project, redirect_drafts, now)?;
        apply_drafts(&txn, namespace, project, page_drafts, now)?;
        ensure_unique::<Redirect>(&txn, namespace, project)?;
        ensure_unique::<Page>(&txn, namespace, project)?;

        target.version += 1;
        target.published_at = Some(now);
        save_project(&txn, &target)?;
        self.store.commit(txn)?;
        Ok(target)
    }
}

fn lock_error(e: StoreError) -> Error {
    if e.is_lock_contention() {
        Error::PublishInProgress
    } else {
        Error::Store(e)
    }
}

/// Apply drafts CREATE first, then UPDATE, then DELETE, each group in id
/// order, removing every draft row as it is applied.
fn apply_drafts<E: DraftValue>(
    txn: &WriteTransaction,
    namespace: &str,
    project: &str,
    mut pending: Vec<Draft<E>>,
    now: Timestamp,
) -> Result<()> {
    pending.sort_by_key(|d| (d.change_type.apply_order(), d.id));

    for draft in pending {
        match draft.change_type {
            ChangeType::Create => {
                let mut value = draft_value(&draft)?;
                value.normalize();
                let id = next_published_id::<E>(txn)?;
                let record = Record {
                    id,
                    value,
                    is_published: true,
                    created_at: now,
                    updated_at: now,
                };
                put_json(txn, E::PUBLISHED, &entity_key(namespace, project, id), &record)?;
            }
            ChangeType::Update => {
                let old_id = old_id(&draft)?;
                let mut record = published_by_id::<E, _>(txn, namespace, project, old_id)?
                    .ok_or_else(|| Error::not_found(format!("{} {old_id}", E::KIND)))?;
                record.value = draft_value(&draft)?;
                record.value.normalize();
                record.is_published = true;
                record.updated_at = now;
                put_json(txn, E::PUBLISHED, &entity_key(namespace, project, old_id), &record)?;
            }
            ChangeType::Delete => {
                let old_id = old_id(&draft)?;
                if !remove_key(txn, E::PUBLISHED, &entity_key(namespace, project, old_id))? {
                    return Err(Error::not_found(format!("{} {old_id}", E::KIND)));
                }
            }
            ChangeType::Unknown => {
                return Err(Error::BadRequest(format!(
                    "{} draft {} has an unknown change type",
                    E::KIND,
                    draft.id
                )))
            }
        }
        remove_key(txn, E::DRAFTS, &entity_key(namespace, project, draft.id))?;
    }
    Ok(())
}

fn draft_value<E: Clone>(draft: &Draft<E>) -> Result<E> {
    draft.new_value.clone().ok_or(Error::MissingField("newValue"))
}

fn old_id<E>(draft: &Draft<E>) -> Result<u64> {
    draft.old_id.ok_or(Error::MissingField("oldId"))
}

/// The published relation must end with unique sources/paths.
fn ensure_unique<E: DraftValue>(txn: &WriteTransaction, namespace: &str, project: &str) -> Result<()> {
    let rows = published::<E, _>(txn, namespace, project)?;
    let mut seen = HashSet::with_capacity(rows.len());
    for row in &rows {
        let key = row.value.unique_key();
        if !seen.insert(key) {
            return Err(Error::Conflict(format!(
                "{} {key:?} would be published twice",
                E::KIND
            )));
        }
    }
    Ok(())
}
