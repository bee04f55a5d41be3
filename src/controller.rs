//! Browse/Compose state machine over the list and task containers.
//!
//! Inputs never call the store. They either change cursors and focus locally
//! or return a [`StoreRequest`]; the containers only change once the matching
//! [`StoreResponse`] reports success. While a mutation of one entity kind is
//! in flight, further mutations of that kind are refused.

use crate::container::{Container, ContainerKind, Containers};
use crate::input::{Edit, TextInput};
use crate::model::{Item, List, ListId, NewList, NewTask, Task, DEFAULT_LIST_NAME};
use crate::storage::{EntityStore, StoreError};
use crate::worker::{StoreRequest, StoreResponse};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Compose,
}

/// A discrete user intent, already decoded from the raw key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    ToggleFocus,
    ToggleStatus,
    Add,
    Delete,
    Quit,
    Confirm,
    Cancel,
    Edit(Edit),
}

/// What the event loop has to do after an input or completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Idle,
    Request(StoreRequest),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
struct InFlight {
    lists: bool,
    tasks: bool,
}

pub struct Controller {
    containers: Containers,
    focus: ContainerKind,
    mode: Mode,
    list_input: TextInput,
    task_input: TextInput,
    status: Option<StatusMessage>,
    in_flight: InFlight,
}

/// Read-only view of everything the presentation layer draws.
pub struct Snapshot<'a> {
    pub mode: Mode,
    pub focus: ContainerKind,
    pub lists: &'a Container,
    /// Tasks in display order, each with its index in the container.
    pub tasks: Vec<(usize, &'a Task)>,
    pub tasks_cursor: Option<usize>,
    pub input: Option<&'a TextInput>,
    pub status: Option<&'a StatusMessage>,
}

/// Loads the initial containers, creating the default list on first run.
pub fn bootstrap<S: EntityStore + ?Sized>(store: &mut S) -> Result<Controller, StoreError> {
    let mut lists = store.find_all_lists()?;
    if lists.is_empty() {
        let default = store.create_list(NewList::named(DEFAULT_LIST_NAME))?;
        debug!(id = default.id, "created default list");
        lists.push(default);
    }
    let tasks = match lists.first() {
        Some(first) => store.find_tasks_for_list(first.id)?,
        None => Vec::new(),
    };
    Ok(Controller::new(lists, tasks))
}

impl Controller {
    pub fn new(lists: Vec<List>, tasks: Vec<Task>) -> Self {
        Controller {
            containers: Containers {
                lists: Container::new(lists.into_iter().map(Item::List).collect()),
                tasks: Container::new(task_items(tasks)),
            },
            focus: ContainerKind::Lists,
            mode: Mode::Browse,
            list_input: TextInput::new("Enter a new list..."),
            task_input: TextInput::new("Enter new todo..."),
            status: None,
            in_flight: InFlight::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn focus(&self) -> ContainerKind {
        self.focus
    }

    pub fn containers(&self) -> &Containers {
        &self.containers
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn selected_list(&self) -> Option<&List> {
        self.containers
            .lists
            .current_item()
            .ok()
            .and_then(Item::as_list)
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.containers
            .tasks
            .current_item()
            .ok()
            .and_then(Item::as_task)
    }

    pub fn handle(&mut self, input: Input) -> Effect {
        self.status = None;
        match self.mode {
            Mode::Browse => self.handle_browse(input),
            Mode::Compose => self.handle_compose(input),
        }
    }

    fn handle_browse(&mut self, input: Input) -> Effect {
        match input {
            Input::Up => self.navigate(-1),
            Input::Down => self.navigate(1),
            Input::ToggleFocus => {
                self.focus = self.focus.other();
                Effect::Idle
            }
            Input::ToggleStatus => self.toggle_status(),
            Input::Add => {
                self.mode = Mode::Compose;
                self.active_input_mut().reset();
                Effect::Idle
            }
            Input::Delete => self.delete_current(),
            Input::Quit => Effect::Quit,
            Input::Confirm | Input::Cancel | Input::Edit(_) => Effect::Idle,
        }
    }

    fn handle_compose(&mut self, input: Input) -> Effect {
        match input {
            Input::Confirm => self.submit(),
            Input::Cancel => {
                self.active_input_mut().reset();
                self.mode = Mode::Browse;
                Effect::Idle
            }
            Input::Edit(edit) => {
                self.active_input_mut().apply(edit);
                Effect::Idle
            }
            _ => Effect::Idle,
        }
    }

    fn navigate(&mut self, delta: isize) -> Effect {
        let container = self.containers.get_mut(self.focus);
        let before = container.cursor();
        container.move_cursor(delta);
        if self.focus == ContainerKind::Lists && container.cursor() != before {
            return self.reload_tasks();
        }
        Effect::Idle
    }

    // Tasks of the previous list must not stay actionable while the reload runs.
    fn reload_tasks(&mut self) -> Effect {
        self.containers.tasks.set_items(Vec::new());
        match self.selected_list().map(|l| l.id) {
            Some(list_id) => Effect::Request(StoreRequest::LoadTasks { list_id }),
            None => Effect::Idle,
        }
    }

    fn toggle_status(&mut self) -> Effect {
        let Some(task) = self.current_task() else {
            return Effect::Idle;
        };
        let mut updated = task.clone();
        updated.status = updated.status.toggled();
        if self.refuse_if_busy(ContainerKind::Tasks) {
            return Effect::Idle;
        }
        self.in_flight.tasks = true;
        Effect::Request(StoreRequest::SaveTask { task: updated })
    }

    fn delete_current(&mut self) -> Effect {
        match self.focus {
            ContainerKind::Lists => {
                let Some(list) = self.selected_list() else {
                    return Effect::Idle;
                };
                if list.is_default() {
                    debug!("refusing to delete the default list");
                    return Effect::Idle;
                }
                let list = list.clone();
                if self.refuse_if_busy(ContainerKind::Lists) {
                    return Effect::Idle;
                }
                self.in_flight.lists = true;
                Effect::Request(StoreRequest::DeleteList { list })
            }
            ContainerKind::Tasks => {
                let Some(task) = self.current_task().cloned() else {
                    return Effect::Idle;
                };
                if self.refuse_if_busy(ContainerKind::Tasks) {
                    return Effect::Idle;
                }
                self.in_flight.tasks = true;
                Effect::Request(StoreRequest::DeleteTask { task })
            }
        }
    }

    fn submit(&mut self) -> Effect {
        let name = self.active_input_mut().value().trim().to_string();
        if name.is_empty() {
            self.active_input_mut().reset();
            self.mode = Mode::Browse;
            return Effect::Idle;
        }
        if self.refuse_if_busy(self.focus) {
            return Effect::Idle;
        }
        self.active_input_mut().reset();
        self.mode = Mode::Browse;
        match self.focus {
            ContainerKind::Lists => {
                self.in_flight.lists = true;
                Effect::Request(StoreRequest::CreateList {
                    list: NewList::named(name),
                })
            }
            ContainerKind::Tasks => match self.selected_list().map(|l| l.id) {
                Some(list_id) => {
                    self.in_flight.tasks = true;
                    Effect::Request(StoreRequest::CreateTask {
                        task: NewTask::ready(name, list_id),
                    })
                }
                None => {
                    self.report_error("No list selected to add the task to".into());
                    Effect::Idle
                }
            },
        }
    }

    /// Applies a finished store request to the containers.
    pub fn complete(&mut self, response: StoreResponse) -> Effect {
        match response {
            StoreResponse::TasksLoaded { list_id, result } => {
                if self.selected_list().map(|l| l.id) != Some(list_id) {
                    debug!(list_id, "discarding stale task reload");
                    return Effect::Idle;
                }
                match result {
                    Ok(tasks) => self.containers.tasks.set_items(task_items(tasks)),
                    Err(err) => {
                        self.containers.tasks.set_items(Vec::new());
                        self.report_error(format!("Could not load tasks: {err}"));
                    }
                }
                Effect::Idle
            }
            StoreResponse::ListCreated(result) => {
                self.in_flight.lists = false;
                match result {
                    Ok(list) => {
                        let before = self.selected_list().map(|l| l.id);
                        self.report_info(format!("List {} created", list.name));
                        self.containers.lists.insert_item(Item::List(list));
                        if self.selected_list().map(|l| l.id) != before {
                            return self.reload_tasks();
                        }
                    }
                    Err(err) => self.report_error(format!("Could not create list: {err}")),
                }
                Effect::Idle
            }
            StoreResponse::TaskCreated(result) => {
                self.in_flight.tasks = false;
                match result {
                    Ok(task) => {
                        self.report_info(format!("Task {} created", task.name));
                        if self.selected_list().map(|l| l.id) == Some(task.list_id) {
                            self.containers.tasks.insert_item(Item::Task(task));
                        }
                    }
                    Err(err) => self.report_error(format!("Could not create task: {err}")),
                }
                Effect::Idle
            }
            StoreResponse::TaskSaved { task, result } => {
                self.in_flight.tasks = false;
                match result {
                    Ok(()) => {
                        self.report_info(format!("{} is {}", task.name, task.status));
                        let idx = self.containers.tasks.position(|item| matches_task(item, &task));
                        if let Some(slot) = idx.and_then(|i| self.containers.tasks.get_mut(i)) {
                            *slot = Item::Task(task);
                        }
                    }
                    Err(err) => self.report_error(format!("Could not update task: {err}")),
                }
                Effect::Idle
            }
            StoreResponse::ListDeleted { list, result } => {
                self.in_flight.lists = false;
                match result {
                    Ok(()) => {
                        self.report_info(format!("List {} deleted", list.name));
                        let selected = self.selected_list().map(|l| l.id);
                        let idx = self.containers.lists.position(|item| matches_list(item, list.id));
                        if let Some(idx) = idx {
                            if let Err(err) = self.containers.lists.remove_at(idx) {
                                warn!(%err, "list vanished before removal");
                            }
                        }
                        if selected != Some(list.id) {
                            // Rows below the deleted one shifted up; follow the selected list.
                            let kept = selected.and_then(|id| {
                                self.containers.lists.position(|item| matches_list(item, id))
                            });
                            if let Some(idx) = kept {
                                if let Err(err) = self.containers.lists.select(idx) {
                                    warn!(%err, "could not restore list selection");
                                }
                            }
                        }
                        if self.selected_list().map(|l| l.id) != selected {
                            return self.reload_tasks();
                        }
                    }
                    Err(err) => self.report_error(format!("Could not delete list: {err}")),
                }
                Effect::Idle
            }
            StoreResponse::TaskDeleted { task, result } => {
                self.in_flight.tasks = false;
                match result {
                    Ok(()) => {
                        self.report_info(format!("Task {} deleted", task.name));
                        let idx = self.containers.tasks.position(|item| matches_task(item, &task));
                        if let Some(idx) = idx {
                            if let Err(err) = self.containers.tasks.remove_at(idx) {
                                warn!(%err, "task vanished before removal");
                            }
                        }
                    }
                    Err(err) => self.report_error(format!("Could not delete task: {err}")),
                }
                Effect::Idle
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let mut tasks: Vec<(usize, &Task)> = self
            .containers
            .tasks
            .items()
            .iter()
            .enumerate()
            .filter_map(|(idx, item)| item.as_task().map(|t| (idx, t)))
            .collect();
        tasks.sort_by_key(|(_, task)| (task.created_at, task.id));
        Snapshot {
            mode: self.mode,
            focus: self.focus,
            lists: &self.containers.lists,
            tasks,
            tasks_cursor: self.containers.tasks.cursor(),
            input: match self.mode {
                Mode::Compose => Some(self.active_input()),
                Mode::Browse => None,
            },
            status: self.status.as_ref(),
        }
    }

    fn active_input(&self) -> &TextInput {
        match self.focus {
            ContainerKind::Lists => &self.list_input,
            ContainerKind::Tasks => &self.task_input,
        }
    }

    fn active_input_mut(&mut self) -> &mut TextInput {
        match self.focus {
            ContainerKind::Lists => &mut self.list_input,
            ContainerKind::Tasks => &mut self.task_input,
        }
    }

    fn refuse_if_busy(&mut self, kind: ContainerKind) -> bool {
        let busy = match kind {
            ContainerKind::Lists => self.in_flight.lists,
            ContainerKind::Tasks => self.in_flight.tasks,
        };
        if busy {
            self.report_error(format!("{kind} change still in progress, try again"));
        }
        busy
    }

    fn report_info(&mut self, text: String) {
        self.status = Some(StatusMessage {
            level: StatusLevel::Info,
            text,
        });
    }

    fn report_error(&mut self, text: String) {
        warn!(message = %text, "reporting error to user");
        self.status = Some(StatusMessage {
            level: StatusLevel::Error,
            text,
        });
    }
}

fn task_items(mut tasks: Vec<Task>) -> Vec<Item> {
    tasks.sort_by_key(|t| (t.created_at, t.id));
    tasks.into_iter().map(Item::Task).collect()
}

fn matches_list(item: &Item, id: ListId) -> bool {
    item.as_list().map(|l| l.id) == Some(id)
}

fn matches_task(item: &Item, task: &Task) -> bool {
    item.as_task().map(|t| t.id) == Some(task.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use crate::testing::RecordingStore;
    use crate::worker::execute;

    /// Feeds `input` and every follow-up request through `store` synchronously.
    fn drive(controller: &mut Controller, store: &mut RecordingStore, input: Input) -> Effect {
        let mut effect = controller.handle(input);
        while let Effect::Request(request) = effect {
            effect = controller.complete(execute(store, request));
        }
        effect
    }

    fn type_text(controller: &mut Controller, store: &mut RecordingStore, text: &str) {
        for ch in text.chars() {
            drive(controller, store, Input::Edit(Edit::Insert(ch)));
        }
    }

    fn labels(container: &Container) -> Vec<String> {
        container.items().iter().map(|i| i.label().to_string()).collect()
    }

    fn started(store: &mut RecordingStore) -> Controller {
        let controller = bootstrap(store).unwrap();
        store.calls.clear();
        store.writes = 0;
        controller
    }

    #[test]
    fn bootstrap_creates_default_list_on_empty_store() {
        let mut store = RecordingStore::new();
        let controller = bootstrap(&mut store).unwrap();
        assert_eq!(labels(&controller.containers().lists), vec!["Default"]);
        assert_eq!(controller.containers().lists.cursor(), Some(0));
        assert!(controller.containers().tasks.is_empty());
        assert_eq!(store.calls, vec!["create_list"]);
    }

    #[test]
    fn bootstrap_loads_tasks_of_first_list() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("home chore", default.id);
        store.seed_task("report", work.id);

        let controller = bootstrap(&mut store).unwrap();
        assert_eq!(labels(&controller.containers().tasks), vec!["home chore"]);
        assert!(store.calls.is_empty());
    }

    #[test]
    fn adding_a_task_to_default_list() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        let default_id = controller.selected_list().unwrap().id;

        drive(&mut controller, &mut store, Input::ToggleFocus);
        drive(&mut controller, &mut store, Input::Add);
        assert_eq!(controller.mode(), Mode::Compose);
        type_text(&mut controller, &mut store, "Buy milk");
        drive(&mut controller, &mut store, Input::Confirm);

        assert_eq!(controller.mode(), Mode::Browse);
        let tasks = controller.containers().tasks.items();
        assert_eq!(tasks.len(), 1);
        let task = tasks[0].as_task().unwrap();
        assert_eq!(task.name, "Buy milk");
        assert_eq!(task.status, Status::Ready);
        assert_eq!(task.list_id, default_id);
        assert_eq!(task.description, "");
        assert_eq!(store.inner().find_tasks_for_list(default_id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_last_task_clamps_cursor() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        for name in ["one", "two", "three"] {
            store.seed_task(name, default.id);
        }
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);
        drive(&mut controller, &mut store, Input::Down);
        drive(&mut controller, &mut store, Input::Down);
        assert_eq!(controller.containers().tasks.cursor(), Some(2));

        drive(&mut controller, &mut store, Input::Delete);

        assert_eq!(labels(&controller.containers().tasks), vec!["one", "two"]);
        assert_eq!(controller.containers().tasks.cursor(), Some(1));
        assert_eq!(store.calls, vec!["delete_task"]);
    }

    #[test]
    fn moving_between_lists_reloads_tasks() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("laundry", default.id);
        store.seed_task("standup", work.id);
        store.seed_task("review", work.id);
        let mut controller = started(&mut store);

        drive(&mut controller, &mut store, Input::Down);
        assert_eq!(controller.containers().lists.cursor(), Some(1));
        assert_eq!(labels(&controller.containers().tasks), vec!["standup", "review"]);

        drive(&mut controller, &mut store, Input::Up);
        assert_eq!(controller.containers().lists.cursor(), Some(0));
        assert_eq!(labels(&controller.containers().tasks), vec!["laundry"]);
        let selected = controller.selected_list().unwrap().id;
        assert!(controller
            .containers()
            .tasks
            .items()
            .iter()
            .all(|i| i.as_task().unwrap().list_id == selected));
    }

    #[test]
    fn list_move_clamps_task_cursor_to_shorter_list() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        for name in ["a", "b", "c"] {
            store.seed_task(name, default.id);
        }
        store.seed_task("only", work.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);
        drive(&mut controller, &mut store, Input::Down);
        drive(&mut controller, &mut store, Input::Down);
        drive(&mut controller, &mut store, Input::ToggleFocus);

        drive(&mut controller, &mut store, Input::Down);

        assert_eq!(controller.containers().tasks.cursor(), Some(0));
        assert_eq!(controller.current_task().unwrap().name, "only");
    }

    #[test]
    fn deleting_default_list_does_nothing() {
        let mut store = RecordingStore::new();
        store.seed_list("Default");
        let mut controller = started(&mut store);
        let before = controller.containers().lists.clone();

        let effect = drive(&mut controller, &mut store, Input::Delete);

        assert_eq!(effect, Effect::Idle);
        assert!(store.calls.is_empty());
        assert_eq!(controller.containers().lists, before);
        assert_eq!(store.inner().find_all_lists().unwrap().len(), 1);
    }

    #[test]
    fn failed_task_create_leaves_tasks_unchanged() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);
        drive(&mut controller, &mut store, Input::Add);
        type_text(&mut controller, &mut store, "Buy milk");
        store.fail_writes = true;

        drive(&mut controller, &mut store, Input::Confirm);

        assert_eq!(controller.mode(), Mode::Browse);
        assert!(controller.containers().tasks.is_empty());
        let status = controller.status().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.contains("read-only"));
    }

    #[test]
    fn toggling_twice_restores_status_with_two_writes() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let mut task = store.seed_task("water plants", default.id);
        task.status = Status::InProgress;
        store.save_task(&task).unwrap();
        let mut controller = started(&mut store);

        drive(&mut controller, &mut store, Input::ToggleStatus);
        assert_eq!(controller.current_task().unwrap().status, Status::Done);
        drive(&mut controller, &mut store, Input::ToggleStatus);

        assert_eq!(controller.current_task().unwrap().status, Status::InProgress);
        assert_eq!(store.writes, 2);
        let stored = store.inner().find_all_tasks().unwrap();
        assert_eq!(stored[0].status, Status::InProgress);
    }

    #[test]
    fn failed_toggle_keeps_old_status() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        store.seed_task("water plants", default.id);
        let mut controller = started(&mut store);
        store.fail_writes = true;

        drive(&mut controller, &mut store, Input::ToggleStatus);

        assert_eq!(controller.current_task().unwrap().status, Status::Ready);
        assert_eq!(controller.status().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn empty_containers_make_actions_no_ops() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);

        for input in [Input::Up, Input::Down, Input::ToggleStatus, Input::Delete] {
            assert_eq!(drive(&mut controller, &mut store, input), Effect::Idle);
        }
        assert!(store.calls.is_empty());
        assert_eq!(controller.containers().tasks.cursor(), None);
    }

    #[test]
    fn empty_compose_input_writes_nothing() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Add);
        type_text(&mut controller, &mut store, "   ");
        drive(&mut controller, &mut store, Input::Confirm);

        assert_eq!(controller.mode(), Mode::Browse);
        assert!(store.calls.is_empty());
        assert_eq!(controller.containers().lists.len(), 1);
    }

    #[test]
    fn cancel_discards_buffer() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Add);
        type_text(&mut controller, &mut store, "Work");
        drive(&mut controller, &mut store, Input::Cancel);
        assert_eq!(controller.mode(), Mode::Browse);

        drive(&mut controller, &mut store, Input::Add);
        assert_eq!(controller.snapshot().input.unwrap().value(), "");
        assert!(store.calls.is_empty());
    }

    #[test]
    fn browse_keys_are_inert_while_composing() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Add);
        assert_eq!(drive(&mut controller, &mut store, Input::Quit), Effect::Idle);
        assert_eq!(drive(&mut controller, &mut store, Input::Delete), Effect::Idle);
        assert_eq!(controller.mode(), Mode::Compose);
    }

    #[test]
    fn adding_a_list_appends_without_moving_selection() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Add);
        type_text(&mut controller, &mut store, "Work");
        drive(&mut controller, &mut store, Input::Confirm);

        assert_eq!(labels(&controller.containers().lists), vec!["Default", "Work"]);
        assert_eq!(controller.containers().lists.cursor(), Some(0));
        assert_eq!(controller.status().unwrap().level, StatusLevel::Info);
    }

    #[test]
    fn duplicate_list_name_is_reported() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Add);
        type_text(&mut controller, &mut store, "Default");
        drive(&mut controller, &mut store, Input::Confirm);

        assert_eq!(controller.containers().lists.len(), 1);
        assert_eq!(controller.status().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn deleting_a_list_reloads_tasks_and_keeps_focus() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("laundry", default.id);
        store.seed_task("standup", work.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Down);

        drive(&mut controller, &mut store, Input::Delete);

        assert_eq!(labels(&controller.containers().lists), vec!["Default"]);
        assert_eq!(controller.containers().lists.cursor(), Some(0));
        assert_eq!(labels(&controller.containers().tasks), vec!["laundry"]);
        assert_eq!(controller.focus(), ContainerKind::Lists);
        assert!(store.inner().find_tasks_for_list(work.id).unwrap().is_empty());
    }

    #[test]
    fn second_mutation_is_refused_while_first_is_in_flight() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        store.seed_task("a", default.id);
        store.seed_task("b", default.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);

        let first = controller.handle(Input::Delete);
        let second = controller.handle(Input::Delete);
        assert!(matches!(first, Effect::Request(StoreRequest::DeleteTask { .. })));
        assert_eq!(second, Effect::Idle);
        assert_eq!(controller.status().unwrap().level, StatusLevel::Error);

        let Effect::Request(request) = first else {
            unreachable!()
        };
        controller.complete(execute(&mut store, request));
        assert_eq!(labels(&controller.containers().tasks), vec!["b"]);
        assert!(matches!(
            controller.handle(Input::Delete),
            Effect::Request(StoreRequest::DeleteTask { .. })
        ));
    }

    #[test]
    fn stale_task_reload_is_ignored() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("laundry", default.id);
        store.seed_task("standup", work.id);
        let mut controller = started(&mut store);

        let to_work = controller.handle(Input::Down);
        let back = controller.handle(Input::Up);
        for effect in [to_work, back] {
            if let Effect::Request(request) = effect {
                controller.complete(execute(&mut store, request));
            }
        }

        assert_eq!(controller.selected_list().unwrap().name, "Default");
        assert_eq!(labels(&controller.containers().tasks), vec!["laundry"]);
    }

    #[test]
    fn pending_reload_never_shows_tasks_of_another_list() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("laundry", default.id);
        store.seed_task("standup", work.id);
        let mut controller = started(&mut store);

        let reload = controller.handle(Input::Down);
        assert_eq!(
            reload,
            Effect::Request(StoreRequest::LoadTasks { list_id: work.id })
        );
        let selected = controller.selected_list().unwrap().id;
        assert!(controller
            .containers()
            .tasks
            .items()
            .iter()
            .all(|i| i.as_task().unwrap().list_id == selected));

        controller.handle(Input::ToggleFocus);
        assert_eq!(controller.handle(Input::Delete), Effect::Idle);
        assert_eq!(controller.handle(Input::ToggleStatus), Effect::Idle);

        let Effect::Request(request) = reload else {
            unreachable!()
        };
        controller.complete(execute(&mut store, request));
        assert_eq!(labels(&controller.containers().tasks), vec!["standup"]);
    }

    #[test]
    fn list_delete_keeps_selection_that_moved_meanwhile() {
        let mut store = RecordingStore::new();
        store.seed_list("Default");
        store.seed_list("A");
        let b = store.seed_list("B");
        store.seed_list("C");
        store.seed_task("from b", b.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Down);

        let delete = controller.handle(Input::Delete);
        drive(&mut controller, &mut store, Input::Down);
        assert_eq!(controller.selected_list().unwrap().name, "B");

        let Effect::Request(request) = delete else {
            unreachable!()
        };
        let effect = controller.complete(execute(&mut store, request));

        assert_eq!(effect, Effect::Idle);
        assert_eq!(labels(&controller.containers().lists), vec!["Default", "B", "C"]);
        assert_eq!(controller.selected_list().unwrap().name, "B");
        assert_eq!(labels(&controller.containers().tasks), vec!["from b"]);
    }

    #[test]
    fn failed_task_delete_keeps_item() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        store.seed_task("a", default.id);
        store.seed_task("b", default.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::ToggleFocus);
        drive(&mut controller, &mut store, Input::Down);
        store.fail_writes = true;

        drive(&mut controller, &mut store, Input::Delete);

        assert_eq!(labels(&controller.containers().tasks), vec!["a", "b"]);
        assert_eq!(controller.containers().tasks.cursor(), Some(1));
        assert_eq!(controller.status().unwrap().level, StatusLevel::Error);
        assert_eq!(store.inner().find_tasks_for_list(default.id).unwrap().len(), 2);
    }

    #[test]
    fn failed_list_delete_keeps_list_and_tasks() {
        let mut store = RecordingStore::new();
        store.seed_list("Default");
        let work = store.seed_list("Work");
        store.seed_task("standup", work.id);
        let mut controller = started(&mut store);
        drive(&mut controller, &mut store, Input::Down);
        store.fail_writes = true;

        let effect = drive(&mut controller, &mut store, Input::Delete);

        assert_eq!(effect, Effect::Idle);
        assert_eq!(store.calls, vec!["delete_list"]);
        assert_eq!(labels(&controller.containers().lists), vec!["Default", "Work"]);
        assert_eq!(controller.containers().lists.cursor(), Some(1));
        assert_eq!(labels(&controller.containers().tasks), vec!["standup"]);
        assert_eq!(controller.status().unwrap().level, StatusLevel::Error);
    }

    #[test]
    fn failed_task_reload_clears_tasks_and_reports() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        store.seed_task("laundry", default.id);
        let mut controller = started(&mut store);

        controller.complete(StoreResponse::TasksLoaded {
            list_id: default.id,
            result: Err(StoreError::Format {
                path: store.inner().path().to_path_buf(),
                source: serde_yaml::from_str::<u64>("not a number").unwrap_err(),
            }),
        });

        assert!(controller.containers().tasks.is_empty());
        assert_eq!(controller.containers().tasks.cursor(), None);
        let status = controller.status().unwrap();
        assert_eq!(status.level, StatusLevel::Error);
        assert!(status.text.starts_with("Could not load tasks"));
    }

    #[test]
    fn task_created_for_another_list_is_not_shown() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        store.seed_list("Work");
        let mut controller = started(&mut store);
        let created = store.seed_task("elsewhere", default.id + 1);

        controller.complete(StoreResponse::TaskCreated(Ok(created)));

        assert!(controller.containers().tasks.is_empty());
    }

    #[test]
    fn snapshot_orders_tasks_by_creation_time() {
        let mut store = RecordingStore::new();
        let default = store.seed_list("Default");
        let older = store.seed_task("older", default.id);
        let newer = store.seed_task("newer", default.id);
        let mut controller = Controller::new(
            store.inner().find_all_lists().unwrap(),
            vec![newer.clone(), older.clone()],
        );
        controller.complete(StoreResponse::TasksLoaded {
            list_id: default.id,
            result: Ok(vec![newer, older]),
        });

        let snapshot = controller.snapshot();
        let names: Vec<&str> = snapshot.tasks.iter().map(|(_, t)| t.name.as_str()).collect();
        assert_eq!(names, vec!["older", "newer"]);
        assert_eq!(snapshot.tasks_cursor, Some(0));
    }

    #[test]
    fn quit_ends_the_session() {
        let mut store = RecordingStore::new();
        let mut controller = started(&mut store);
        assert_eq!(drive(&mut controller, &mut store, Input::Quit), Effect::Quit);
    }
}
