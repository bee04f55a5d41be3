//! Ordered, cursor-addressed views over lists and tasks.
//!
//! The cursor is `None` exactly when a container is empty, and otherwise
//! always indexes an existing item. Every mutation below re-establishes that.

use crate::model::Item;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Lists,
    Tasks,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerError {
    #[error("index {index} out of range for {len} item(s)")]
    OutOfRange { index: usize, len: usize },
    #[error("container is empty")]
    EmptyContainer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    items: Vec<Item>,
    cursor: Option<usize>,
}

/// The two containers that live for a whole session.
#[derive(Debug, Clone, Default)]
pub struct Containers {
    pub lists: Container,
    pub tasks: Container,
}

impl ContainerKind {
    pub fn other(self) -> Self {
        match self {
            ContainerKind::Lists => ContainerKind::Tasks,
            ContainerKind::Tasks => ContainerKind::Lists,
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Lists => f.write_str("List"),
            ContainerKind::Tasks => f.write_str("Task"),
        }
    }
}

impl Container {
    pub fn new(items: Vec<Item>) -> Self {
        let mut container = Container::default();
        container.set_items(items);
        container
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Moves the cursor by `delta`, stopping at either end.
    pub fn move_cursor(&mut self, delta: isize) {
        let Some(cursor) = self.cursor else {
            return;
        };
        let last = self.items.len().saturating_sub(1) as isize;
        self.cursor = Some((cursor as isize + delta).clamp(0, last) as usize);
    }

    pub fn set_items(&mut self, items: Vec<Item>) {
        self.items = items;
        self.clamp_cursor();
    }

    /// Appends without moving the cursor, unless there was nothing to point at.
    pub fn insert_item(&mut self, item: Item) {
        self.items.push(item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Item, ContainerError> {
        if index >= self.items.len() {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let removed = self.items.remove(index);
        self.clamp_cursor();
        Ok(removed)
    }

    pub fn select(&mut self, index: usize) -> Result<(), ContainerError> {
        if index >= self.items.len() {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.cursor = Some(index);
        Ok(())
    }

    pub fn current_item(&self) -> Result<&Item, ContainerError> {
        self.cursor
            .and_then(|idx| self.items.get(idx))
            .ok_or(ContainerError::EmptyContainer)
    }

    pub fn position<F>(&self, predicate: F) -> Option<usize>
    where
        F: FnMut(&Item) -> bool,
    {
        self.items.iter().position(predicate)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    // A cursor past the end snaps to the last item, not to the top.
    fn clamp_cursor(&mut self) {
        self.cursor = match (self.items.len(), self.cursor) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(cursor)) if cursor >= len => Some(len - 1),
            (_, cursor) => cursor,
        };
    }
}

impl Containers {
    pub fn get_mut(&mut self, kind: ContainerKind) -> &mut Container {
        match kind {
            ContainerKind::Lists => &mut self.lists,
            ContainerKind::Tasks => &mut self.tasks,
        }
    }
}
