//! Store double shared by the unit tests.

use crate::model::{List, ListId, NewList, NewTask, Task};
use crate::storage::{database_path, EntityStore, StoreError, StoreResult, YamlStore};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// A real YAML store in a temp directory that records every call and can be
/// told to fail writes.
pub struct RecordingStore {
    inner: YamlStore,
    _dir: TempDir,
    pub calls: Vec<&'static str>,
    pub writes: usize,
    pub fail_writes: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let inner = YamlStore::open(database_path(dir.path(), "tasks")).expect("open store");
        RecordingStore {
            inner,
            _dir: dir,
            calls: Vec::new(),
            writes: 0,
            fail_writes: false,
        }
    }

    /// Inserts a list without recording the call.
    pub fn seed_list(&mut self, name: &str) -> List {
        self.inner.create_list(NewList::named(name)).expect("seed list")
    }

    pub fn seed_task(&mut self, name: &str, list_id: ListId) -> Task {
        self.inner
            .create_task(NewTask::ready(name, list_id))
            .expect("seed task")
    }

    pub fn inner(&self) -> &YamlStore {
        &self.inner
    }

    fn write(&mut self, call: &'static str) -> StoreResult<()> {
        self.calls.push(call);
        if self.fail_writes {
            return Err(StoreError::Io {
                path: self.inner.path().to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "disk is read-only"),
            });
        }
        self.writes += 1;
        Ok(())
    }
}

impl EntityStore for RecordingStore {
    fn find_all_lists(&self) -> StoreResult<Vec<List>> {
        self.inner.find_all_lists()
    }

    fn find_all_tasks(&self) -> StoreResult<Vec<Task>> {
        self.inner.find_all_tasks()
    }

    fn find_tasks_for_list(&self, list_id: ListId) -> StoreResult<Vec<Task>> {
        self.inner.find_tasks_for_list(list_id)
    }

    fn create_list(&mut self, list: NewList) -> StoreResult<List> {
        self.write("create_list")?;
        self.inner.create_list(list)
    }

    fn create_task(&mut self, task: NewTask) -> StoreResult<Task> {
        self.write("create_task")?;
        self.inner.create_task(task)
    }

    fn save_task(&mut self, task: &Task) -> StoreResult<()> {
        self.write("save_task")?;
        self.inner.save_task(task)
    }

    fn delete_list(&mut self, list: &List) -> StoreResult<()> {
        self.write("delete_list")?;
        self.inner.delete_list(list)
    }

    fn delete_task(&mut self, task: &Task) -> StoreResult<()> {
        self.write("delete_task")?;
        self.inner.delete_task(task)
    }
}

/// Collects formatted tracing output for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let capture = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || capture.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buffer = self.buffer.lock().expect("log buffer");
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
