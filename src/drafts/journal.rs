//! Draft journal: staged CREATE/UPDATE/DELETE intents per project.

use std::collections::HashSet;

use tracing::debug;

use super::validation::DraftValue;
use crate::error::{Error, Result};
use crate::model::{now_millis, ChangeType, Draft, DraftInput, DraftView};
use crate::publish::quota::PageLimits;
use crate::store::codec::{put_json, remove_key};
use crate::store::entities::{draft_by_id, drafts, next_draft_id, published, published_by_id};
use crate::store::projects::load_project;
use crate::store::tables::entity_key;
use crate::store::{Store, StoredEntity, TableRead};

/// True iff no published row and no value-carrying draft of the project
/// already claims `key`, ignoring `exclude_entity` and `exclude_draft`.
///
/// A published row that some draft already replaces or deletes no longer
/// claims its key: the draft decides what survives the next publish.
pub fn is_source_available<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
    key: &str,
    exclude_entity: Option<u64>,
    exclude_draft: Option<u64>,
) -> Result<bool> {
    let pending = drafts::<E, _>(txn, namespace, project)?;
    let shadowed: HashSet<u64> = pending.iter().filter_map(Draft::replaces).collect();

    let draft_claims = pending.iter().any(|d| {
        Some(d.id) != exclude_draft
            && d.claims_value()
            && d.new_value.as_ref().map(|v| v.unique_key()) == Some(key)
    });
    if draft_claims {
        return Ok(false);
    }

    let published_claims = published::<E, _>(txn, namespace, project)?
        .iter()
        .any(|r| {
            Some(r.id) != exclude_entity
                && !shadowed.contains(&r.id)
                && r.value.unique_key() == key
        });
    Ok(!published_claims)
}

#[derive(Clone)]
pub struct DraftJournal {
    store: Store,
    limits: PageLimits,
}

impl DraftJournal {
    pub fn new(store: Store, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// Stage a change.
    pub fn insert<E: DraftValue>(
        &self,
        namespace: &str,
        project: &str,
        input: DraftInput<E>,
    ) -> Result<Draft<E>> {
        let DraftInput {
            change_type,
            old_id,
            value,
        } = input;

        let value = match change_type {
            ChangeType::Create => {
                if old_id.is_some() {
                    return Err(Error::BadRequest(
                        "oldId is not allowed on CREATE".to_string(),
                    ));
                }
                Some(value.ok_or(Error::MissingField("value"))?)
            }
            ChangeType::Update => {
                old_id.ok_or(Error::MissingField("oldId"))?;
                Some(value.ok_or(Error::MissingField("value"))?)
            }
            ChangeType::Delete => {
                old_id.ok_or(Error::MissingField("oldId"))?;
                None
            }
            ChangeType::Unknown => {
                return Err(Error::BadRequest("unknown change type".to_string()))
            }
        };

        let txn = self.store.begin_write()?;
        load_project(&txn, namespace, project)?;

        if let Some(old_id) = old_id {
            if published_by_id::<E, _>(&txn, namespace, project, old_id)?.is_none() {
                return Err(Error::not_found(format!("{} {old_id}", E::KIND)));
            }
            let pending = drafts::<E, _>(&txn, namespace, project)?;
            if pending.iter().any(|d| d.old_id == Some(old_id)) {
                return Err(Error::Conflict(format!(
                    "{} {old_id} already has a pending draft",
                    E::KIND
                )));
            }
        }

        let value = match value {
            Some(mut value) => {
                value.normalize();
                value.validate(&self.limits)?;
                let key = value.unique_key();
                if !is_source_available::<E, _>(&txn, namespace, project, key, old_id, None)? {
                    return Err(Error::Conflict(format!("{} {key:?} already exists", E::KIND)));
                }
                Some(value)
            }
            None => None,
        };

        let now = now_millis();
        let draft = Draft {
            id: next_draft_id::<E>(&txn)?,
            change_type,
            old_id,
            new_value: value,
            created_at: now,
            updated_at: now,
        };
        put_json(&txn, E::DRAFTS, &entity_key(namespace, project, draft.id), &draft)?;
        self.store.commit(txn)?;

        debug!(
            namespace = %namespace,
            project = %project,
            kind = E::KIND,
            draft_id = draft.id,
            change = ?draft.change_type,
            "draft staged"
        );
        Ok(draft)
    }

    /// All drafts of a project with their referenced published rows.
    pub fn list<E: DraftValue>(&self, namespace: &str, project: &str) -> Result<Vec<DraftView<E>>> {
        let txn = self.store.begin_read()?;
        load_project(&txn, namespace, project)?;
        drafts::<E, _>(&txn, namespace, project)?
            .into_iter()
            .map(|draft| preload(&txn, namespace, project, draft))
            .collect()
    }

    pub fn get<E: DraftValue>(&self, namespace: &str, project: &str, id: u64) -> Result<DraftView<E>> {
        let txn = self.store.begin_read()?;
        let draft = draft_by_id::<E, _>(&txn, namespace, project, id)?
            .ok_or_else(|| Error::not_found(format!("{} draft {id}", E::KIND)))?;
        preload(&txn, namespace, project, draft)
    }

    /// Replace the payload of a CREATE or UPDATE draft.
    pub fn update<E: DraftValue>(
        &self,
        namespace: &str,
        project: &str,
        id: u64,
        mut value: E,
    ) -> Result<Draft<E>> {
        let txn = self.store.begin_write()?;
        let mut draft = draft_by_id::<E, _>(&txn, namespace, project, id)?
            .ok_or_else(|| Error::not_found(format!("{} draft {id}", E::KIND)))?;
        if draft.change_type == ChangeType::Delete {
            return Err(Error::BadRequest("delete drafts carry no value".to_string()));
        }

        value.normalize();
        value.validate(&self.limits)?;
        let key = value.unique_key();
        if !is_source_available::<E, _>(&txn, namespace, project, key, draft.replaces(), Some(id))? {
            return Err(Error::Conflict(format!("{} {key:?} already exists", E::KIND)));
        }

        draft.new_value = Some(value);
        draft.updated_at = now_millis();
        put_json(&txn, E::DRAFTS, &entity_key(namespace, project, id), &draft)?;
        self.store.commit(txn)?;
        Ok(draft)
    }

    /// Discard a draft.
    pub fn delete<E: DraftValue>(&self, namespace: &str, project: &str, id: u64) -> Result<()> {
        let txn = self.store.begin_write()?;
        if !remove_key(&txn, E::DRAFTS, &entity_key(namespace, project, id))? {
            return Err(Error::not_found(format!("{} draft {id}", E::KIND)));
        }
        self.store.commit(txn)?;
        Ok(())
    }

    /// Source availability check against committed state.
    pub fn is_source_available<E: DraftValue>(
        &self,
        namespace: &str,
        project: &str,
        key: &str,
        exclude_entity: Option<u64>,
        exclude_draft: Option<u64>,
    ) -> Result<bool> {
        let txn = self.store.begin_read()?;
        is_source_available::<E, _>(&txn, namespace, project, key, exclude_entity, exclude_draft)
    }
}

fn preload<E: StoredEntity, T: TableRead>(
    txn: &T,
    namespace: &str,
    project: &str,
    draft: Draft<E>,
) -> Result<DraftView<E>> {
    let old = match draft.old_id {
        Some(old_id) => published_by_id::<E, _>(txn, namespace, project, old_id)?,
        None => None,
    };
    Ok(DraftView { draft, old })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentType, Page, PageType, Record, Redirect, RedirectStatus, RedirectType};

    fn setup() -> (Store, DraftJournal) {
        let store = Store::open_in_memory().unwrap();
        store.create_namespace("ns", "Namespace", 1).unwrap();
        store.create_project("ns", "proj", "Project", 1).unwrap();
        let journal = DraftJournal::new(store.clone(), PageLimits::default());
        (store, journal)
    }

    fn basic(source: &str, target: &str) -> Redirect {
        Redirect::new(RedirectType::Basic, source, target, RedirectStatus::MovedPermanent)
    }

    /// Write a published redirect directly, bypassing publish.
    fn seed(store: &Store, id: u64, redirect: Redirect) {
        let txn = store.begin_write().unwrap();
        let record = Record {
            id,
            value: redirect,
            is_published: true,
            created_at: 1,
            updated_at: 1,
        };
        put_json(&txn, Redirect::PUBLISHED, &entity_key("ns", "proj", id), &record).unwrap();
        txn.commit().unwrap();
    }

    #[test]
    fn test_insert_and_list() {
        let (_, journal) = setup();
        let draft = journal
            .insert("ns", "proj", DraftInput::create(basic("/old", "/new")))
            .unwrap();
        assert_eq!(draft.change_type, ChangeType::Create);

        let views = journal.list::<Redirect>("ns", "proj").unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].draft.id, draft.id);
        assert!(views[0].old.is_none());
    }

    #[test]
    fn test_missing_project() {
        let (_, journal) = setup();
        let err = journal
            .insert("ns", "nope", DraftInput::create(basic("/a", "/b")))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_required_fields() {
        let (_, journal) = setup();
        let update = DraftInput::<Redirect> {
            change_type: ChangeType::Update,
            old_id: None,
            value: Some(basic("/a", "/b")),
        };
        assert!(matches!(
            journal.insert("ns", "proj", update),
            Err(Error::MissingField("oldId"))
        ));
        let create = DraftInput::<Redirect> {
            change_type: ChangeType::Create,
            old_id: None,
            value: None,
        };
        assert!(matches!(
            journal.insert("ns", "proj", create),
            Err(Error::MissingField("value"))
        ));
    }

    #[test]
    fn test_create_with_old_id_rejected() {
        let (store, journal) = setup();
        seed(&store, 1, basic("/x", "/y"));
        let create = DraftInput::<Redirect> {
            change_type: ChangeType::Create,
            old_id: Some(1),
            value: Some(basic("/x", "/z")),
        };
        assert!(matches!(
            journal.insert("ns", "proj", create),
            Err(Error::BadRequest(_))
        ));
        assert!(journal.list::<Redirect>("ns", "proj").unwrap().is_empty());
        assert!(!journal
            .is_source_available::<Redirect>("ns", "proj", "/x", None, None)
            .unwrap());
    }

    #[test]
    fn test_duplicate_create_conflicts() {
        let (_, journal) = setup();
        journal
            .insert("ns", "proj", DraftInput::create(basic("/a", "/b")))
            .unwrap();
        let err = journal
            .insert("ns", "proj", DraftInput::create(basic("/a", "/c")))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_published_source_is_reserved() {
        let (store, journal) = setup();
        seed(&store, 1, basic("/taken", "/x"));
        assert!(!journal
            .is_source_available::<Redirect>("ns", "proj", "/taken", None, None)
            .unwrap());
        assert!(journal
            .is_source_available::<Redirect>("ns", "proj", "/taken", Some(1), None)
            .unwrap());
        assert!(matches!(
            journal.insert("ns", "proj", DraftInput::create(basic("/taken", "/y"))),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_delete_draft_frees_source() {
        let (store, journal) = setup();
        seed(&store, 1, basic("/x", "/y"));
        journal.insert("ns", "proj", DraftInput::<Redirect>::delete(1)).unwrap();

        assert!(journal
            .is_source_available::<Redirect>("ns", "proj", "/x", None, None)
            .unwrap());
        journal
            .insert("ns", "proj", DraftInput::create(basic("/x", "/z")))
            .unwrap();
    }

    #[test]
    fn test_update_keeps_own_source() {
        let (store, journal) = setup();
        seed(&store, 1, basic("/x", "/y"));
        let draft = journal
            .insert("ns", "proj", DraftInput::update(1, basic("/x", "/z")))
            .unwrap();
        let view = journal.get::<Redirect>("ns", "proj", draft.id).unwrap();
        assert_eq!(view.old.unwrap().value.target, "/y");
    }

    #[test]
    fn test_one_draft_per_old_entity() {
        let (store, journal) = setup();
        seed(&store, 1, basic("/x", "/y"));
        journal
            .insert("ns", "proj", DraftInput::update(1, basic("/x", "/z")))
            .unwrap();
        assert!(matches!(
            journal.insert("ns", "proj", DraftInput::<Redirect>::delete(1)),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_old_entity_must_exist() {
        let (_, journal) = setup();
        assert!(matches!(
            journal.insert("ns", "proj", DraftInput::<Redirect>::delete(42)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_update_and_delete_draft() {
        let (_, journal) = setup();
        let a = journal
            .insert("ns", "proj", DraftInput::create(basic("/a", "/1")))
            .unwrap();
        let b = journal
            .insert("ns", "proj", DraftInput::create(basic("/b", "/2")))
            .unwrap();

        // Renaming onto another draft's source conflicts, keeping its own does not.
        assert!(matches!(
            journal.update("ns", "proj", a.id, basic("/b", "/1")),
            Err(Error::Conflict(_))
        ));
        let updated = journal.update("ns", "proj", a.id, basic("/a", "/3")).unwrap();
        assert_eq!(updated.new_value.unwrap().target, "/3");

        journal.delete::<Redirect>("ns", "proj", b.id).unwrap();
        assert!(matches!(
            journal.delete::<Redirect>("ns", "proj", b.id),
            Err(Error::NotFound(_))
        ));
        assert_eq!(journal.list::<Redirect>("ns", "proj").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_regex_surfaces_on_insert() {
        let (_, journal) = setup();
        let value = Redirect::new(RedirectType::Regex, "/a/(", "/b", RedirectStatus::Found);
        assert!(matches!(
            journal.insert("ns", "proj", DraftInput::create(value)),
            Err(Error::InvalidSource(_))
        ));
    }

    #[test]
    fn test_page_drafts_are_sized_and_limited() {
        let store = Store::open_in_memory().unwrap();
        store.create_namespace("ns", "Namespace", 1).unwrap();
        store.create_project("ns", "proj", "Project", 1).unwrap();
        let limits = PageLimits {
            size_limit: 8,
            total_size_limit: 16,
        };
        let journal = DraftJournal::new(store, limits);

        let mut page = Page::new(PageType::Basic, "/robots.txt", "allow", ContentType::TextPlain);
        page.content_size = 999;
        let draft = journal.insert("ns", "proj", DraftInput::create(page)).unwrap();
        assert_eq!(draft.new_value.unwrap().content_size, 5);

        let big = Page::new(PageType::Basic, "/big.txt", "123456789", ContentType::TextPlain);
        assert!(matches!(
            journal.insert("ns", "proj", DraftInput::create(big)),
            Err(Error::QuotaExceeded(_))
        ));
    }

    #[test]
    fn test_redirects_and_pages_do_not_share_keys() {
        let (_, journal) = setup();
        journal
            .insert("ns", "proj", DraftInput::create(basic("/same", "/r")))
            .unwrap();
        let page = Page::new(PageType::Basic, "/same", "x", ContentType::TextPlain);
        journal.insert("ns", "proj", DraftInput::create(page)).unwrap();
    }
}
