//! Namespaces and projects, with cascading deletes.

use tracing::info;

use super::codec::{put_json, remove_key, remove_prefix, TableRead};
use super::db::Store;
use super::tables::*;
use crate::error::{Error, Result};
use crate::model::project::is_valid_code;
use crate::model::{Namespace, Project, Timestamp};

/// Load a project inside an open transaction.
pub fn load_project<T: TableRead>(txn: &T, namespace: &str, project: &str) -> Result<Project> {
    txn.get_json(PROJECTS, &project_key(namespace, project))?
        .ok_or_else(|| Error::not_found(format!("project {namespace}/{project}")))
}

pub fn save_project(txn: &redb::WriteTransaction, project: &Project) -> Result<()> {
    let key = project_key(&project.namespace_code, &project.project_code);
    put_json(txn, PROJECTS, &key, project)?;
    Ok(())
}

fn check_code(field: &str, code: &str) -> Result<()> {
    if is_valid_code(code) {
        Ok(())
    } else {
        Err(Error::BadRequest(format!(
            "{field} {code:?} must match ^[a-zA-Z0-9_-]+$"
        )))
    }
}

impl Store {
    pub fn create_namespace(&self, code: &str, name: &str, now: Timestamp) -> Result<Namespace> {
        check_code("namespace code", code)?;
        let txn = self.begin_write()?;
        if txn.get_json::<Namespace>(NAMESPACES, code)?.is_some() {
            return Err(Error::Conflict(format!("namespace {code} already exists")));
        }
        let namespace = Namespace {
            code: code.to_string(),
            name: name.to_string(),
            created_at: now,
        };
        put_json(&txn, NAMESPACES, code, &namespace)?;
        self.commit(txn)?;
        info!(namespace = %code, "namespace created");
        Ok(namespace)
    }

    pub fn get_namespace(&self, code: &str) -> Result<Option<Namespace>> {
        let txn = self.begin_read()?;
        Ok(txn.get_json(NAMESPACES, code)?)
    }

    pub fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let txn = self.begin_read()?;
        Ok(txn.scan_json(NAMESPACES, "")?)
    }

    /// Delete a namespace together with its projects and all their children.
    pub fn delete_namespace(&self, code: &str) -> Result<()> {
        let txn = self.begin_write()?;
        if !remove_key(&txn, NAMESPACES, code)? {
            return Err(Error::not_found(format!("namespace {code}")));
        }
        let prefix = namespace_prefix(code);
        let projects = remove_prefix(&txn, PROJECTS, &prefix)?;
        let mut children = 0;
        for table in PROJECT_CHILDREN {
            children += remove_prefix(&txn, table, &prefix)?;
        }
        self.commit(txn)?;
        info!(namespace = %code, projects, children, "namespace deleted");
        Ok(())
    }

    pub fn create_project(
        &self,
        namespace: &str,
        code: &str,
        name: &str,
        now: Timestamp,
    ) -> Result<Project> {
        check_code("project code", code)?;
        let txn = self.begin_write()?;
        if txn.get_json::<Namespace>(NAMESPACES, namespace)?.is_none() {
            return Err(Error::not_found(format!("namespace {namespace}")));
        }
        if txn
            .get_json::<Project>(PROJECTS, &project_key(namespace, code))?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "project {namespace}/{code} already exists"
            )));
        }
        let project = Project::new(namespace, code, name, now);
        save_project(&txn, &project)?;
        self.commit(txn)?;
        info!(namespace = %namespace, project = %code, "project created");
        Ok(project)
    }

    pub fn get_project(&self, namespace: &str, project: &str) -> Result<Option<Project>> {
        let txn = self.begin_read()?;
        Ok(txn.get_json(PROJECTS, &project_key(namespace, project))?)
    }

    pub fn list_projects(&self, namespace: &str) -> Result<Vec<Project>> {
        let txn = self.begin_read()?;
        Ok(txn.scan_json(PROJECTS, &namespace_prefix(namespace))?)
    }

    /// Current published version; the cursor agents poll.
    pub fn project_version(&self, namespace: &str, project: &str) -> Result<u64> {
        let txn = self.begin_read()?;
        Ok(load_project(&txn, namespace, project)?.version)
    }

    /// Delete a project and its redirects, pages, drafts and agents.
    pub fn delete_project(&self, namespace: &str, project: &str) -> Result<()> {
        let txn = self.begin_write()?;
        if !remove_key(&txn, PROJECTS, &project_key(namespace, project))? {
            return Err(Error::not_found(format!("project {namespace}/{project}")));
        }
        let prefix = project_prefix(namespace, project);
        let mut children = 0;
        for table in PROJECT_CHILDREN {
            children += remove_prefix(&txn, table, &prefix)?;
        }
        self.commit(txn)?;
        info!(namespace = %namespace, project = %project, children, "project deleted");
        Ok(())
    }
}
