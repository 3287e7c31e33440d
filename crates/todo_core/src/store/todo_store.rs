//! Todo store reducer and change notification.
//!
//! # Invariants
//! - Collection order is insertion order unless replaced wholesale.
//! - `version` increases by exactly one per effective mutation.
//! - A rejected `add` leaves collection, version and subscribers untouched.
//! - Listeners run synchronously inside the mutation and must not call back
//!   into the owner of this store.

use crate::model::todo::{Todo, TodoId, TodoValidationError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

pub type StoreResult<T> = Result<T, StoreError>;

/// Callback invoked after every effective mutation.
pub type StoreListener = Box<dyn Fn(&StoreEvent) + Send>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Process-unique identity of one `TodoStore` instance.
///
/// Versions are only comparable between snapshots carrying the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl Display for StoreId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "store-{}", self.0)
    }
}

/// Rejection reasons for store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(TodoValidationError),
    DuplicateId(TodoId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "todo id already exists: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicateId(_) => None,
        }
    }
}

impl From<TodoValidationError> for StoreError {
    fn from(value: TodoValidationError) -> Self {
        Self::Validation(value)
    }
}

/// What an effective mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    ReplacedAll { count: usize },
    Added { id: TodoId },
    Removed { id: TodoId },
}

/// Notification delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEvent {
    pub version: u64,
    pub change: StoreChange,
}

/// Complete ordered collection at one store version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub store: StoreId,
    pub version: u64,
    pub todos: Vec<Todo>,
}

/// Explicit store object; owners pass it by reference to sync and UI code.
pub struct TodoStore {
    id: StoreId,
    todos: Vec<Todo>,
    version: u64,
    listeners: Vec<(SubscriptionId, StoreListener)>,
    next_subscription: u64,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    pub fn new() -> Self {
        Self {
            id: StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed)),
            todos: Vec::new(),
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Discards the current collection and installs `todos` verbatim.
    ///
    /// No validation is performed; an empty sequence is accepted.
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        let count = todos.len();
        self.todos = todos;
        self.commit(StoreChange::ReplacedAll { count });
    }

    /// Appends `todo` to the end of the collection.
    ///
    /// # Errors
    /// - `StoreError::Validation` when the record fails creation rules.
    /// - `StoreError::DuplicateId` when the id is already present.
    pub fn add(&mut self, todo: Todo) -> StoreResult<()> {
        todo.validate()?;
        if self.contains(&todo.id) {
            return Err(StoreError::DuplicateId(todo.id));
        }

        let id = todo.id.clone();
        self.todos.push(todo);
        self.commit(StoreChange::Added { id });
        Ok(())
    }

    /// Removes the record with `id`; absent ids are a no-op returning `None`.
    pub fn remove(&mut self, id: &str) -> Option<Todo> {
        let index = self.todos.iter().position(|todo| todo.id == id)?;
        let removed = self.todos.remove(index);
        self.commit(StoreChange::Removed {
            id: removed.id.clone(),
        });
        Some(removed)
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Clones the collection together with the current version.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            store: self.id,
            version: self.version,
            todos: self.todos.clone(),
        }
    }

    /// Registers a listener called after every effective mutation.
    pub fn subscribe(&mut self, listener: impl Fn(&StoreEvent) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Drops a listener; returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, change: StoreChange) {
        self.version += 1;
        debug!(
            "event=store_mutation module=store status=ok version={} size={} change={}",
            self.version,
            self.todos.len(),
            change_label(&change)
        );
        let event = StoreEvent {
            version: self.version,
            change,
        };
        for (_, listener) in &self.listeners {
            listener(&event);
        }
    }
}

fn change_label(change: &StoreChange) -> &'static str {
    match change {
        StoreChange::ReplacedAll { .. } => "replace_all",
        StoreChange::Added { .. } => "add",
        StoreChange::Removed { .. } => "remove",
    }
}
