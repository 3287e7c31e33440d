//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose todo lifecycle functions to Dart via FRB.
//! - Translate core reports into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One service (and one database) per process; reopening elsewhere fails.
//! - A failed snapshot write still reports `ok=true`: the todo exists in memory.

use chrono::{DateTime, Utc};
use log::warn;
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use todo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CoreConfig, DeleteDecision, DeleteOutcome, HydrateOutcome, Importance, SqliteStorage, Todo,
    TodoForm, TodoResult, TodoService,
};
use todo_core::sync::SyncResult;

static SESSION: OnceCell<Session> = OnceCell::new();

struct Session {
    db_path: PathBuf,
    service: TodoService<SqliteStorage>,
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Todo row as rendered by the list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub todo_name: String,
    /// RFC 3339 UTC timestamp.
    pub deadline: Option<String>,
    /// `low|medium|high`.
    pub importance: Option<String>,
    pub description: String,
    /// RFC 3339 UTC timestamp.
    pub created_at: String,
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    pub todo_id: Option<String>,
    /// Human-readable status; carries the transient notice on write failure.
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, todo_id: Option<String>) -> Self {
        Self {
            ok: true,
            todo_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            todo_id: None,
            message: message.into(),
        }
    }
}

/// Opens the todo database at `db_path` and hydrates the store.
///
/// # FFI contract
/// - Sync call; performs file I/O.
/// - Idempotent for the same path; a different path after open fails.
/// - Empty `db_path` falls back to `TODO_DB_PATH` or the temp dir default.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_open(db_path: String) -> TodoActionResponse {
    let requested = match resolve_db_path(&db_path) {
        Ok(path) => path,
        Err(message) => return TodoActionResponse::failure(message),
    };
    match session_at(requested) {
        Ok(session) => match session.service.start() {
            Ok(outcome) => TodoActionResponse::success(hydrate_message(&outcome), None),
            Err(err) => TodoActionResponse::failure(format!("todo_open failed: {err}")),
        },
        Err(message) => TodoActionResponse::failure(message),
    }
}

/// Lists todos in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> TodoListResponse {
    match session().and_then(|session| {
        session
            .service
            .todos()
            .map_err(|err| format!("todo_list failed: {err}"))
    }) {
        Ok(todos) => list_response(todos),
        Err(message) => TodoListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

/// Creates one todo.
///
/// # FFI contract
/// - `deadline`: optional RFC 3339 timestamp.
/// - `importance`: optional `low|medium|high` (case-insensitive).
/// - Rejected input never creates a record.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_create(
    todo_name: String,
    deadline: Option<String>,
    importance: Option<String>,
    description: String,
) -> TodoActionResponse {
    let fields = match parse_fields(todo_name, deadline, importance, description) {
        Ok(fields) => fields,
        Err(message) => return TodoActionResponse::failure(message),
    };
    let session = match session() {
        Ok(session) => session,
        Err(message) => return TodoActionResponse::failure(message),
    };

    match session.service.create(&fields) {
        Ok(report) => {
            let message = match &report.persistence {
                Ok(_) => "Todo created.".to_string(),
                Err(err) => format!("Todo created but not saved: {err}"),
            };
            TodoActionResponse::success(message, Some(report.todo.id))
        }
        Err(err) => TodoActionResponse::failure(format!("todo_create failed: {err}")),
    }
}

/// Deletes one todo after the UI collected the user's decision.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(todo_id: String, confirmed: bool) -> TodoActionResponse {
    let session = match session() {
        Ok(session) => session,
        Err(message) => return TodoActionResponse::failure(message),
    };
    let decision = if confirmed {
        DeleteDecision::Confirmed
    } else {
        DeleteDecision::Cancelled
    };

    match session.service.delete(todo_id.trim(), &decision) {
        Ok(DeleteOutcome::Cancelled) => TodoActionResponse::success("Delete cancelled.", None),
        Ok(DeleteOutcome::NotFound) => TodoActionResponse::success("Todo already gone.", None),
        Ok(DeleteOutcome::Deleted { todo, persistence }) => {
            let message = match persistence {
                Ok(_) => "Todo deleted.".to_string(),
                Err(err) => format!("Todo deleted but not saved: {err}"),
            };
            TodoActionResponse::success(message, Some(todo.id))
        }
        Err(err) => TodoActionResponse::failure(format!("todo_delete failed: {err}")),
    }
}

/// Re-reads persisted todos (pull-to-refresh) and returns the list.
///
/// A read failure keeps the in-memory list and sets `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_refresh() -> TodoListResponse {
    let session = match session() {
        Ok(session) => session,
        Err(message) => {
            return TodoListResponse {
                ok: false,
                items: Vec::new(),
                message,
            }
        }
    };

    let refreshed = session.service.refresh();
    refresh_response(refreshed, session.service.todos())
}

fn session() -> Result<&'static Session, String> {
    match SESSION.get() {
        Some(session) => Ok(session),
        None => {
            let config = CoreConfig::from_env().map_err(|err| format!("invalid config: {err}"))?;
            let session = session_at(config.db_path)?;
            if let Err(err) = session.service.start() {
                warn!("event=ffi_lazy_open module=ffi status=error error={err}");
            }
            Ok(session)
        }
    }
}

fn session_at(db_path: PathBuf) -> Result<&'static Session, String> {
    let session = SESSION.get_or_try_init(|| -> Result<Session, String> {
        let storage = SqliteStorage::open(&db_path)
            .map_err(|err| format!("todo DB open failed: {err}"))?;
        Ok(Session {
            db_path: db_path.clone(),
            service: TodoService::new(storage),
        })
    })?;

    if session.db_path != db_path {
        return Err(format!(
            "todo DB already open at `{}`; refusing to switch to `{}`",
            session.db_path.display(),
            db_path.display()
        ));
    }
    Ok(session)
}

fn resolve_db_path(raw: &str) -> Result<PathBuf, String> {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        return Ok(PathBuf::from(trimmed));
    }
    CoreConfig::from_env()
        .map(|config| config.db_path)
        .map_err(|err| format!("invalid config: {err}"))
}

fn parse_fields(
    todo_name: String,
    deadline: Option<String>,
    importance: Option<String>,
    description: String,
) -> Result<TodoForm, String> {
    let deadline = match deadline.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            DateTime::parse_from_rfc3339(raw)
                .map_err(|err| format!("invalid deadline `{raw}`: {err}"))?
                .with_timezone(&Utc),
        ),
    };
    let importance = match importance.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Importance::parse(raw)
                .ok_or_else(|| format!("invalid importance `{raw}`; expected low|medium|high"))?,
        ),
    };

    Ok(TodoForm {
        todo_name,
        deadline,
        importance,
        description,
    })
}

fn hydrate_message(outcome: &HydrateOutcome) -> String {
    match outcome {
        HydrateOutcome::Loaded { count } => format!("Loaded {count} todo(s)."),
        HydrateOutcome::Empty => "No saved todos.".to_string(),
        HydrateOutcome::Recovered { error } => {
            format!("Saved todos could not be read; starting empty: {error}")
        }
        HydrateOutcome::Skipped => "Already loaded.".to_string(),
    }
}

fn refresh_response(
    refreshed: TodoResult<SyncResult<usize>>,
    todos: TodoResult<Vec<Todo>>,
) -> TodoListResponse {
    let failed = |message: String, items: Vec<Todo>| TodoListResponse {
        ok: false,
        items: items.into_iter().map(to_todo_item).collect(),
        message: format!("todo_refresh failed: {message}"),
    };
    match (refreshed, todos) {
        (Err(err), _) | (_, Err(err)) => failed(err.to_string(), Vec::new()),
        (Ok(Err(err)), Ok(todos)) => failed(err.to_string(), todos),
        (Ok(Ok(_)), Ok(todos)) => list_response(todos),
    }
}

fn list_response(todos: Vec<Todo>) -> TodoListResponse {
    let items = todos.into_iter().map(to_todo_item).collect::<Vec<_>>();
    let message = if items.is_empty() {
        "No todos.".to_string()
    } else {
        format!("{} todo(s).", items.len())
    };
    TodoListResponse {
        ok: true,
        items,
        message,
    }
}

fn to_todo_item(todo: Todo) -> TodoItem {
    TodoItem {
        id: todo.id,
        todo_name: todo.todo_name,
        deadline: todo.deadline.map(|value| value.to_rfc3339()),
        importance: todo.importance.map(|value| value.as_str().to_string()),
        description: todo.description,
        created_at: todo.created_at.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, parse_fields, ping, refresh_response, todo_create,
        todo_delete, todo_list, todo_open, todo_refresh,
    };
    use chrono::Utc;
    use std::path::Path;
    use std::sync::{Mutex, MutexGuard};
    use std::time::{SystemTime, UNIX_EPOCH};
    use todo_core::{StorageError, SyncError, Todo, TodoError};

    // SQLite keeps this database in memory; the process-wide session never
    // touches the filesystem.
    const TEST_DB: &str = ":memory:";
    // Overlapping creates are rejected; tests take turns.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn open_test_db() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let response = todo_open(TEST_DB.to_string());
        assert!(response.ok, "{}", response.message);
        guard
    }

    fn sample(name: &str) -> Todo {
        Todo {
            id: name.to_string(),
            todo_name: name.to_string(),
            deadline: None,
            importance: None,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "/tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn create_then_list_contains_todo() {
        let _serial = open_test_db();
        let name = unique_token("ffi-create");
        let created = todo_create(
            name.clone(),
            Some("2030-01-01T00:00:00Z".to_string()),
            Some("High".to_string()),
            "from ffi".to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let id = created.todo_id.expect("create should return todo_id");

        let listed = todo_list();
        let item = listed
            .items
            .iter()
            .find(|item| item.id == id)
            .expect("created todo should be listed");
        assert_eq!(item.todo_name, name);
        assert_eq!(item.importance.as_deref(), Some("high"));
        assert!(item.deadline.as_deref().unwrap().starts_with("2030-01-01T00:00:00"));
    }

    #[test]
    fn create_rejects_blank_name() {
        let _serial = open_test_db();
        let response = todo_create("   ".to_string(), None, None, String::new());
        assert!(!response.ok);
        assert!(response.message.contains("empty"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let _serial = open_test_db();
        let created = todo_create(unique_token("ffi-delete"), None, None, String::new());
        let id = created.todo_id.expect("create should return todo_id");

        let cancelled = todo_delete(id.clone(), false);
        assert!(cancelled.ok);
        assert!(todo_list().items.iter().any(|item| item.id == id));

        let deleted = todo_delete(id.clone(), true);
        assert_eq!(deleted.todo_id.as_deref(), Some(id.as_str()));
        assert!(!todo_list().items.iter().any(|item| item.id == id));
    }

    #[test]
    fn refresh_keeps_persisted_todos() {
        let _serial = open_test_db();
        let created = todo_create(unique_token("ffi-refresh"), None, None, String::new());
        let id = created.todo_id.expect("create should return todo_id");

        let refreshed = todo_refresh();
        assert!(refreshed.ok, "{}", refreshed.message);
        assert!(refreshed.items.iter().any(|item| item.id == id));
    }

    #[test]
    fn test_session_leaves_no_database_file() {
        let _serial = open_test_db();
        todo_create(unique_token("ffi-nofile"), None, None, String::new());
        assert!(!Path::new(TEST_DB).exists());
    }

    #[test]
    fn refresh_reports_unreadable_state_as_failure() {
        let response = refresh_response(
            Ok(Ok(1)),
            Err(TodoError::StateUnavailable("store")),
        );
        assert!(!response.ok);
        assert!(response.items.is_empty());
        assert!(response.message.contains("store"));
    }

    #[test]
    fn refresh_read_error_keeps_in_memory_items() {
        let read_err = StorageError::Unavailable("keystore locked".to_string());
        let response = refresh_response(
            Ok(Err(SyncError::Read(read_err))),
            Ok(vec![sample("kept")]),
        );
        assert!(!response.ok);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].id, "kept");
    }

    #[test]
    fn parse_fields_rejects_bad_importance_and_deadline() {
        let err = parse_fields("x".into(), None, Some("urgent".into()), String::new())
            .unwrap_err();
        assert!(err.contains("importance"));

        let err = parse_fields("x".into(), Some("tomorrow".into()), None, String::new())
            .unwrap_err();
        assert!(err.contains("deadline"));
    }
}
