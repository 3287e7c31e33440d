//! Todo lifecycle service.
//!
//! # Responsibility
//! - Provide create/delete entry points that drive store and sync together.
//! - Own the creation form draft and the single-submission gate.
//!
//! # Invariants
//! - At most one create runs at a time; overlapping requests are rejected.
//! - A mutation is persisted after the store lock is released, in version order.
//! - The form is reset only when a record was added.
//! - Delete never mutates without a confirmed decision.

use crate::model::form::TodoForm;
use crate::model::todo::{Todo, TodoId, TodoValidationError};
use crate::storage::PersistenceAdapter;
use crate::store::{Snapshot, StoreError, StoreEvent, SubscriptionId, TodoStore};
use crate::sync::{HydrateOutcome, SyncController, SyncResult, WriteStatus};
use chrono::Utc;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

pub type TodoResult<T> = Result<T, TodoError>;

/// Service error for todo use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Field values break creation rules; nothing was mutated.
    Validation(TodoValidationError),
    /// Another record already uses this id; nothing was mutated.
    DuplicateId(TodoId),
    /// A create request is already being processed.
    SubmissionInProgress,
    /// An internal lock was poisoned by a panicking holder.
    StateUnavailable(&'static str),
}

impl Display for TodoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "todo id already exists: {id}"),
            Self::SubmissionInProgress => write!(f, "a todo is already being created"),
            Self::StateUnavailable(name) => write!(f, "todo state unavailable: {name}"),
        }
    }
}

impl Error for TodoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TodoValidationError> for TodoError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for TodoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Validation(err) => Self::Validation(err),
            StoreError::DuplicateId(id) => Self::DuplicateId(id),
        }
    }
}

/// Create-flow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatePhase {
    Idle,
    Submitting,
}

/// Final answer of the delete confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteDecision {
    Confirmed,
    Cancelled,
}

/// External collaborator asking the user to confirm a delete.
pub trait ConfirmPrompt {
    fn confirm_delete(&self, id: &str) -> DeleteDecision;
}

impl ConfirmPrompt for DeleteDecision {
    fn confirm_delete(&self, _id: &str) -> DeleteDecision {
        *self
    }
}

/// Result of a successful create.
///
/// `persistence` carries the best-effort snapshot write result; the record
/// stays in memory even when it is an error.
#[derive(Debug)]
pub struct CreateReport {
    pub todo: Todo,
    pub persistence: SyncResult<WriteStatus>,
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// Prompt declined; nothing changed.
    Cancelled,
    /// No record with that id; nothing changed.
    NotFound,
    /// Record removed and snapshot write attempted.
    Deleted {
        todo: Todo,
        persistence: SyncResult<WriteStatus>,
    },
}

/// Use-case facade over one store and its sync controller.
pub struct TodoService<A: PersistenceAdapter> {
    store: Mutex<TodoStore>,
    sync: SyncController<A>,
    form: Mutex<TodoForm>,
    submitting: AtomicBool,
}

impl<A: PersistenceAdapter> TodoService<A> {
    /// Creates a service with an empty store over `adapter`.
    pub fn new(adapter: A) -> Self {
        Self::with_controller(SyncController::new(adapter))
    }

    /// Creates a service using a preconfigured sync controller.
    pub fn with_controller(sync: SyncController<A>) -> Self {
        Self {
            store: Mutex::new(TodoStore::new()),
            sync,
            form: Mutex::new(TodoForm::default()),
            submitting: AtomicBool::new(false),
        }
    }

    pub fn sync(&self) -> &SyncController<A> {
        &self.sync
    }

    /// Hydrates the store from persistence; only the first call does work.
    pub fn start(&self) -> TodoResult<HydrateOutcome> {
        let mut store = self.lock_store()?;
        Ok(self.sync.hydrate(&mut store))
    }

    /// Re-reads the persisted snapshot (pull-to-refresh).
    ///
    /// Returns the loaded count; a read failure keeps the current collection.
    pub fn refresh(&self) -> TodoResult<SyncResult<usize>> {
        let mut store = self.lock_store()?;
        Ok(self.sync.refresh(&mut store))
    }

    /// Creates one todo from explicit field values.
    ///
    /// # Errors
    /// - `TodoError::SubmissionInProgress` while another create is running.
    /// - `TodoError::Validation` / `TodoError::DuplicateId` when the store
    ///   rejects the record; nothing is mutated or persisted.
    pub fn create(&self, fields: &TodoForm) -> TodoResult<CreateReport> {
        let _submission = SubmissionGuard::acquire(&self.submitting)?;

        let todo = Todo::new(
            &fields.todo_name,
            fields.deadline,
            fields.importance,
            fields.description.clone(),
            Utc::now(),
        )
        .inspect_err(|err| {
            warn!("event=todo_create module=service status=rejected error={err}");
        })?;

        let snapshot = {
            let mut store = self.lock_store()?;
            store.add(todo.clone()).inspect_err(|err| {
                warn!("event=todo_create module=service status=rejected error={err}");
            })?;
            store.snapshot()
        };
        let persistence = self.sync.on_store_changed(&snapshot);
        info!(
            "event=todo_create module=service status=ok version={} persisted={}",
            snapshot.version,
            persistence.is_ok()
        );

        Ok(CreateReport { todo, persistence })
    }

    /// Creates one todo from the current form draft.
    ///
    /// The draft is reset after the record is added and left untouched on
    /// error so the caller can retry.
    pub fn submit_form(&self) -> TodoResult<CreateReport> {
        let fields = self.form()?;
        let report = self.create(&fields)?;
        self.lock_form()?.reset(Utc::now());
        Ok(report)
    }

    /// Deletes one todo after asking `prompt` for confirmation.
    pub fn delete(&self, id: &str, prompt: &dyn ConfirmPrompt) -> TodoResult<DeleteOutcome> {
        if prompt.confirm_delete(id) == DeleteDecision::Cancelled {
            info!("event=todo_delete module=service status=cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let (removed, snapshot) = {
            let mut store = self.lock_store()?;
            let removed = store.remove(id);
            (removed, store.snapshot())
        };
        let Some(todo) = removed else {
            info!("event=todo_delete module=service status=not_found");
            return Ok(DeleteOutcome::NotFound);
        };

        let persistence = self.sync.on_store_changed(&snapshot);
        info!(
            "event=todo_delete module=service status=ok version={} persisted={}",
            snapshot.version,
            persistence.is_ok()
        );
        Ok(DeleteOutcome::Deleted { todo, persistence })
    }

    /// Returns the current collection in display order.
    pub fn todos(&self) -> TodoResult<Vec<Todo>> {
        Ok(self.lock_store()?.todos().to_vec())
    }

    pub fn snapshot(&self) -> TodoResult<Snapshot> {
        Ok(self.lock_store()?.snapshot())
    }

    /// Registers a store listener (UI re-render hook).
    ///
    /// Listeners run while the store lock is held and must not call back
    /// into this service.
    pub fn subscribe(
        &self,
        listener: impl Fn(&StoreEvent) + Send + 'static,
    ) -> TodoResult<SubscriptionId> {
        Ok(self.lock_store()?.subscribe(listener))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> TodoResult<bool> {
        Ok(self.lock_store()?.unsubscribe(id))
    }

    pub fn phase(&self) -> CreatePhase {
        if self.submitting.load(Ordering::Acquire) {
            CreatePhase::Submitting
        } else {
            CreatePhase::Idle
        }
    }

    /// Returns a copy of the form draft.
    pub fn form(&self) -> TodoResult<TodoForm> {
        Ok(self.lock_form()?.clone())
    }

    /// Edits the form draft in place.
    pub fn update_form(&self, edit: impl FnOnce(&mut TodoForm)) -> TodoResult<()> {
        edit(&mut *self.lock_form()?);
        Ok(())
    }

    fn lock_store(&self) -> TodoResult<MutexGuard<'_, TodoStore>> {
        self.store
            .lock()
            .map_err(|_| TodoError::StateUnavailable("store"))
    }

    fn lock_form(&self) -> TodoResult<MutexGuard<'_, TodoForm>> {
        self.form
            .lock()
            .map_err(|_| TodoError::StateUnavailable("form"))
    }
}

/// Holds `CreatePhase::Submitting` until dropped.
struct SubmissionGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SubmissionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> TodoResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| TodoError::SubmissionInProgress)?;
        Ok(Self { flag })
    }
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
