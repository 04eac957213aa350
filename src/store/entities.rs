//! Published relations and draft tables for redirects and pages.

use super::codec::{next_id, TableRead};
use super::db::Store;
use super::tables::*;
use crate::error::Result;
use crate::model::{Draft, Entity, Page, Record, Redirect};

/// Table wiring for an [`Entity`] kind.
pub trait StoredEntity: Entity {
    const PUBLISHED: JsonTable;
    const DRAFTS: JsonTable;
    /// Sequence names for published ids and draft ids.
    const PUBLISHED_SEQUENCE: &'static str;
    const DRAFT_SEQUENCE: &'static str;
}

impl StoredEntity for Redirect {
    const PUBLISHED: JsonTable = REDIRECTS;
    const DRAFTS: JsonTable = REDIRECT_DRAFTS;
    const PUBLISHED_SEQUENCE: &'static str = "redirects";
    const DRAFT_SEQUENCE: &'static str = "redirect_drafts";
}

impl StoredEntity for Page {
    const PUBLISHED: JsonTable = PAGES;
    const DRAFTS: JsonTable = PAGE_DRAFTS;
    const PUBLISHED_SEQUENCE: &'static str = "pages";
    const DRAFT_SEQUENCE: &'static str = "page_drafts";
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub total: u64,
    pub items: Vec<T>,
}

pub fn published<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
) -> Result<Vec<Record<E>>> {
    Ok(txn.scan_json(E::PUBLISHED, &project_prefix(namespace, project))?)
}

pub fn published_by_id<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
    id: u64,
) -> Result<Option<Record<E>>> {
    Ok(txn.get_json(E::PUBLISHED, &entity_key(namespace, project, id))?)
}

pub fn drafts<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
) -> Result<Vec<Draft<E>>> {
    Ok(txn.scan_json(E::DRAFTS, &project_prefix(namespace, project))?)
}

pub fn draft_by_id<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
    id: u64,
) -> Result<Option<Draft<E>>> {
    Ok(txn.get_json(E::DRAFTS, &entity_key(namespace, project, id))?)
}

pub fn next_published_id<E: StoredEntity>(txn: &redb::WriteTransaction) -> Result<u64> {
    Ok(next_id(txn, E::PUBLISHED_SEQUENCE)?)
}

pub fn next_draft_id<E: StoredEntity>(txn: &redb::WriteTransaction) -> Result<u64> {
    Ok(next_id(txn, E::DRAFT_SEQUENCE)?)
}

impl Store {
    /// Published rows of a project ordered by id, paginated.
    pub fn list_published<E: StoredEntity>(
        &self,
        namespace: &str,
        project: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Listing<Record<E>>> {
        let txn = self.begin_read()?;
        super::projects::load_project(&txn, namespace, project)?;
        let rows = published::<E, _>(&txn, namespace, project)?;
        Ok(Listing {
            total: rows.len() as u64,
            items: rows.into_iter().skip(offset).take(limit).collect(),
        })
    }

    pub fn get_published<E: StoredEntity>(
        &self,
        namespace: &str,
        project: &str,
        id: u64,
    ) -> Result<Option<Record<E>>> {
        let txn = self.begin_read()?;
        published_by_id(&txn, namespace, project, id)
    }
}
