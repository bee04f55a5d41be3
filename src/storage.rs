use crate::model::{List, ListId, NewList, NewTask, Task, TaskId};
use chrono::Utc;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed store file {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0}")]
    Constraint(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u64 },
}

/// Durable CRUD over lists and tasks.
pub trait EntityStore {
    fn find_all_lists(&self) -> StoreResult<Vec<List>>;
    fn find_all_tasks(&self) -> StoreResult<Vec<Task>>;
    fn find_tasks_for_list(&self, list_id: ListId) -> StoreResult<Vec<Task>>;
    fn create_list(&mut self, list: NewList) -> StoreResult<List>;
    fn create_task(&mut self, task: NewTask) -> StoreResult<Task>;
    /// Inserts or replaces the task with the same id.
    fn save_task(&mut self, task: &Task) -> StoreResult<()>;
    /// Removes the list together with every task it owns.
    fn delete_list(&mut self, list: &List) -> StoreResult<()>;
    fn delete_task(&mut self, task: &Task) -> StoreResult<()>;
}

/// On-disk layout of one database file.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Database {
    #[serde(default)]
    pub next_id: u64,
    #[serde(default)]
    pub lists: Vec<List>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Store backed by a single YAML file, rewritten on every mutation.
///
/// Mutations are staged on a copy and only become visible once the file
/// write succeeds, so a failed write leaves the store as it was.
#[derive(Debug)]
pub struct YamlStore {
    path: PathBuf,
    db: Database,
}

impl YamlStore {
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let db = load_database(&path)?;
        info!(
            path = %path.display(),
            lists = db.lists.len(),
            tasks = db.tasks.len(),
            "opened store"
        );
        Ok(YamlStore { path, db })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit<F, T>(&mut self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Database) -> StoreResult<T>,
    {
        let mut staged = self.db.clone();
        let out = f(&mut staged)?;
        save_database(&self.path, &staged)?;
        self.db = staged;
        Ok(out)
    }
}

impl Database {
    fn allocate_id(&mut self) -> u64 {
        let floor = self
            .lists
            .iter()
            .map(|l| l.id)
            .chain(self.tasks.iter().map(|t| t.id))
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(floor) + 1;
        self.next_id
    }

    fn list_exists(&self, id: ListId) -> bool {
        self.lists.iter().any(|l| l.id == id)
    }

    fn task_index(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}

impl EntityStore for YamlStore {
    fn find_all_lists(&self) -> StoreResult<Vec<List>> {
        Ok(self.db.lists.clone())
    }

    fn find_all_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.db.tasks.clone())
    }

    fn find_tasks_for_list(&self, list_id: ListId) -> StoreResult<Vec<Task>> {
        Ok(self
            .db
            .tasks
            .iter()
            .filter(|t| t.list_id == list_id)
            .cloned()
            .collect())
    }

    fn create_list(&mut self, list: NewList) -> StoreResult<List> {
        let created = self.commit(|db| {
            if db.lists.iter().any(|l| l.name == list.name) {
                return Err(StoreError::Constraint(format!(
                    "a list named {:?} already exists",
                    list.name
                )));
            }
            let created = List {
                id: db.allocate_id(),
                name: list.name,
                created_at: Utc::now(),
            };
            db.lists.push(created.clone());
            Ok(created)
        })?;
        debug!(id = created.id, name = %created.name, "created list");
        Ok(created)
    }

    fn create_task(&mut self, task: NewTask) -> StoreResult<Task> {
        let created = self.commit(|db| {
            if !db.list_exists(task.list_id) {
                return Err(StoreError::Constraint(format!(
                    "task refers to unknown list {}",
                    task.list_id
                )));
            }
            let created = Task {
                id: db.allocate_id(),
                name: task.name,
                description: task.description,
                status: task.status,
                list_id: task.list_id,
                created_at: Utc::now(),
            };
            db.tasks.push(created.clone());
            Ok(created)
        })?;
        debug!(id = created.id, list_id = created.list_id, "created task");
        Ok(created)
    }

    fn save_task(&mut self, task: &Task) -> StoreResult<()> {
        self.commit(|db| {
            if !db.list_exists(task.list_id) {
                return Err(StoreError::Constraint(format!(
                    "task refers to unknown list {}",
                    task.list_id
                )));
            }
            match db.task_index(task.id) {
                Some(idx) => db.tasks[idx] = task.clone(),
                None => {
                    db.next_id = db.next_id.max(task.id);
                    db.tasks.push(task.clone());
                }
            }
            Ok(())
        })?;
        debug!(id = task.id, status = %task.status, "saved task");
        Ok(())
    }

    fn delete_list(&mut self, list: &List) -> StoreResult<()> {
        let orphaned = self.commit(|db| {
            let idx = db
                .lists
                .iter()
                .position(|l| l.id == list.id)
                .ok_or(StoreError::NotFound {
                    kind: "list",
                    id: list.id,
                })?;
            db.lists.remove(idx);
            let before = db.tasks.len();
            db.tasks.retain(|t| t.list_id != list.id);
            Ok(before - db.tasks.len())
        })?;
        debug!(id = list.id, tasks_removed = orphaned, "deleted list");
        Ok(())
    }

    fn delete_task(&mut self, task: &Task) -> StoreResult<()> {
        self.commit(|db| {
            let idx = db.task_index(task.id).ok_or(StoreError::NotFound {
                kind: "task",
                id: task.id,
            })?;
            db.tasks.remove(idx);
            Ok(())
        })?;
        debug!(id = task.id, "deleted task");
        Ok(())
    }
}

pub fn load_database(path: &Path) -> StoreResult<Database> {
    if !path.exists() {
        return Ok(Database::default());
    }
    let data = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if data.trim().is_empty() {
        return Ok(Database::default());
    }
    serde_yaml::from_str(&data).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_database(path: &Path, db: &Database) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let serialized = serde_yaml::to_string(db).map_err(|source| StoreError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("yml.tmp");
    fs::write(&tmp, serialized).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "tasktui")
}

/// Location of the database file named `name` in the user's data directory.
pub fn database_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.yml"))
}
