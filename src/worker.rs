//! Store access off the UI thread.
//!
//! The controller never touches the store directly: it emits a
//! [`StoreRequest`], the worker runs it and answers with a [`StoreResponse`]
//! that the event loop feeds back into the controller. Requests are executed
//! one at a time in submission order.

use crate::model::{List, ListId, NewList, NewTask, Task};
use crate::storage::{EntityStore, StoreError};
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRequest {
    LoadTasks { list_id: ListId },
    CreateList { list: NewList },
    CreateTask { task: NewTask },
    SaveTask { task: Task },
    DeleteList { list: List },
    DeleteTask { task: Task },
}

#[derive(Debug)]
pub enum StoreResponse {
    TasksLoaded {
        list_id: ListId,
        result: Result<Vec<Task>, StoreError>,
    },
    ListCreated(Result<List, StoreError>),
    TaskCreated(Result<Task, StoreError>),
    TaskSaved {
        task: Task,
        result: Result<(), StoreError>,
    },
    ListDeleted {
        list: List,
        result: Result<(), StoreError>,
    },
    TaskDeleted {
        task: Task,
        result: Result<(), StoreError>,
    },
}

impl StoreRequest {
    fn name(&self) -> &'static str {
        match self {
            StoreRequest::LoadTasks { .. } => "load_tasks",
            StoreRequest::CreateList { .. } => "create_list",
            StoreRequest::CreateTask { .. } => "create_task",
            StoreRequest::SaveTask { .. } => "save_task",
            StoreRequest::DeleteList { .. } => "delete_list",
            StoreRequest::DeleteTask { .. } => "delete_task",
        }
    }
}

/// Runs one request against `store` on the calling thread.
pub fn execute<S: EntityStore + ?Sized>(store: &mut S, request: StoreRequest) -> StoreResponse {
    let name = request.name();
    let response = match request {
        StoreRequest::LoadTasks { list_id } => StoreResponse::TasksLoaded {
            list_id,
            result: store.find_tasks_for_list(list_id),
        },
        StoreRequest::CreateList { list } => StoreResponse::ListCreated(store.create_list(list)),
        StoreRequest::CreateTask { task } => StoreResponse::TaskCreated(store.create_task(task)),
        StoreRequest::SaveTask { task } => {
            let result = store.save_task(&task);
            StoreResponse::TaskSaved { task, result }
        }
        StoreRequest::DeleteList { list } => {
            let result = store.delete_list(&list);
            StoreResponse::ListDeleted { list, result }
        }
        StoreRequest::DeleteTask { task } => {
            let result = store.delete_task(&task);
            StoreResponse::TaskDeleted { task, result }
        }
    };
    if let Some(err) = response.error() {
        warn!(request = name, error = %err, "store request failed");
    } else {
        debug!(request = name, "store request done");
    }
    response
}

impl StoreResponse {
    pub fn error(&self) -> Option<&StoreError> {
        match self {
            StoreResponse::TasksLoaded { result, .. } => result.as_ref().err(),
            StoreResponse::ListCreated(result) => result.as_ref().err(),
            StoreResponse::TaskCreated(result) => result.as_ref().err(),
            StoreResponse::TaskSaved { result, .. }
            | StoreResponse::ListDeleted { result, .. }
            | StoreResponse::TaskDeleted { result, .. } => result.as_ref().err(),
        }
    }
}

/// Background thread that owns the store.
pub struct StoreWorker {
    requests: Option<Sender<StoreRequest>>,
    responses: Receiver<StoreResponse>,
    handle: Option<JoinHandle<()>>,
}

impl StoreWorker {
    pub fn spawn<S>(mut store: S) -> Result<Self>
    where
        S: EntityStore + Send + 'static,
    {
        let (request_tx, request_rx) = unbounded::<StoreRequest>();
        let (response_tx, response_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("store-worker".into())
            .spawn(move || {
                for request in request_rx {
                    let response = execute(&mut store, request);
                    if response_tx.send(response).is_err() {
                        break;
                    }
                }
                debug!("store worker stopped");
            })
            .context("spawning store worker")?;
        Ok(StoreWorker {
            requests: Some(request_tx),
            responses: response_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: StoreRequest) -> Result<()> {
        self.requests
            .as_ref()
            .context("store worker already shut down")?
            .send(request)
            .context("store worker is gone")
    }

    /// Next finished request, if any, without blocking.
    pub fn try_recv(&self) -> Result<Option<StoreResponse>> {
        match self.responses.try_recv() {
            Ok(response) => Ok(Some(response)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(anyhow::anyhow!("store worker is gone")),
        }
    }

    #[cfg(test)]
    pub fn responses(&self) -> &Receiver<StoreResponse> {
        &self.responses
    }

    /// Stops accepting requests and waits for queued ones to finish.
    pub fn shutdown(&mut self) {
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("store worker panicked");
            }
        }
    }
}

impl Drop for StoreWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
