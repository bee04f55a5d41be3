use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ListId = u64;
pub type TaskId = u64;

/// Name of the list that always exists and can never be deleted.
pub const DEFAULT_LIST_NAME: &str = "Default";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct List {
    pub id: ListId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub list_id: ListId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    InProgress,
    Done,
}

/// A list that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewList {
    pub name: String,
}

/// A task that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub status: Status,
    pub list_id: ListId,
}

/// Anything a container can hold and render as a one-line label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    List(List),
    Task(Task),
}

impl List {
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_LIST_NAME
    }
}

impl Status {
    /// The status a task moves to when the user toggles it.
    ///
    /// `Done` reopens to `InProgress`; anything else completes.
    pub fn toggled(self) -> Self {
        match self {
            Status::Done => Status::InProgress,
            Status::Ready | Status::InProgress => Status::Done,
        }
    }

    pub fn is_done(self) -> bool {
        self == Status::Done
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Ready => "ready",
            Status::InProgress => "in progress",
            Status::Done => "done",
        };
        f.write_str(label)
    }
}

impl NewList {
    pub fn named(name: impl Into<String>) -> Self {
        NewList { name: name.into() }
    }
}

impl NewTask {
    /// A fresh task as created from the compose prompt.
    pub fn ready(name: impl Into<String>, list_id: ListId) -> Self {
        NewTask {
            name: name.into(),
            description: String::new(),
            status: Status::Ready,
            list_id,
        }
    }
}

impl Item {
    pub fn label(&self) -> &str {
        match self {
            Item::List(list) => &list.name,
            Item::Task(task) => &task.name,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Item::List(list) => Some(list),
            Item::Task(_) => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Item::Task(task) => Some(task),
            Item::List(_) => None,
        }
    }
}

impl From<List> for Item {
    fn from(list: List) -> Self {
        Item::List(list)
    }
}

impl From<Task> for Item {
    fn from(task: Task) -> Self {
        Item::Task(task)
    }
}
