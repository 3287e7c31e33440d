use chrono::Utc;
use todo_core::{Importance, StoreChange, StoreError, Todo, TodoStore, TodoValidationError};

fn task(id: &str, name: &str, importance: Option<Importance>) -> Todo {
    Todo {
        id: id.to_string(),
        todo_name: name.to_string(),
        deadline: None,
        importance,
        description: String::new(),
        created_at: Utc::now(),
    }
}

fn names(store: &TodoStore) -> Vec<&str> {
    store
        .todos()
        .iter()
        .map(|todo| todo.todo_name.as_str())
        .collect()
}

fn three_tasks() -> TodoStore {
    let mut store = TodoStore::new();
    store
        .add(task("1", "Task 1", Some(Importance::High)))
        .unwrap();
    store
        .add(task("2", "Task 2", Some(Importance::Medium)))
        .unwrap();
    store.add(task("3", "Task 3", Some(Importance::Low))).unwrap();
    store
}

#[test]
fn adding_three_tasks_keeps_insertion_order() {
    let store = three_tasks();

    assert_eq!(store.len(), 3);
    assert_eq!(names(&store), vec!["Task 1", "Task 2", "Task 3"]);
    assert_eq!(store.get("3").unwrap().importance, Some(Importance::Low));
}

#[test]
fn removing_middle_task_updates_list() {
    let mut store = three_tasks();

    let removed = store.remove("2").unwrap();
    assert_eq!(removed.todo_name, "Task 2");
    assert_eq!(store.len(), 2);
    assert_eq!(names(&store), vec!["Task 1", "Task 3"]);
}

#[test]
fn removing_absent_id_twice_is_a_noop() {
    let mut store = three_tasks();
    let before = store.snapshot();

    assert!(store.remove("missing").is_none());
    assert!(store.remove("missing").is_none());
    assert_eq!(store.snapshot(), before);
}

#[test]
fn duplicate_id_is_rejected_and_original_kept() {
    let mut store = three_tasks();
    let version = store.version();

    let err = store
        .add(task("2", "Impostor", Some(Importance::Low)))
        .unwrap_err();
    assert_eq!(err, StoreError::DuplicateId("2".to_string()));
    assert_eq!(store.len(), 3);
    assert_eq!(store.get("2").unwrap().todo_name, "Task 2");
    assert_eq!(store.version(), version);
}

#[test]
fn empty_name_is_rejected() {
    let mut store = TodoStore::new();
    let err = store.add(task("1", "  ", None)).unwrap_err();
    assert_eq!(err, StoreError::Validation(TodoValidationError::EmptyName));
    assert!(store.is_empty());
}

#[test]
fn replace_all_installs_sequence_verbatim() {
    let mut store = three_tasks();
    let incoming = vec![task("9", "Nine", None), task("8", "Eight", None)];

    store.replace_all(incoming.clone());
    assert_eq!(store.todos(), incoming.as_slice());

    store.replace_all(Vec::new());
    assert!(store.is_empty());
}

#[test]
fn size_tracks_adds_minus_successful_removes() {
    let mut store = TodoStore::new();
    let mut adds = 0usize;
    let mut removes = 0usize;

    // Deterministic interleaving of adds and removes, some of absent ids.
    for step in 0..60u32 {
        if step % 3 == 2 {
            let target = (step / 2).to_string();
            if store.remove(&target).is_some() {
                removes += 1;
            }
        } else {
            store
                .add(task(&step.to_string(), &format!("Task {step}"), None))
                .unwrap();
            adds += 1;
        }
        assert_eq!(store.len(), adds - removes);
    }
    assert!(removes > 0);
}

#[test]
fn snapshot_version_follows_effective_mutations() {
    let mut store = TodoStore::new();
    let mut changes = Vec::new();

    store.add(task("a", "A", None)).unwrap();
    changes.push(store.version());
    store.remove("nope");
    changes.push(store.version());
    store.replace_all(vec![task("b", "B", None)]);
    changes.push(store.version());

    assert_eq!(changes, vec![1, 1, 2]);
    assert_eq!(store.snapshot().version, 2);
}

#[test]
fn subscribers_see_each_change() {
    use std::sync::{Arc, Mutex};

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let mut store = TodoStore::new();
    store.subscribe(move |event| sink.lock().unwrap().push(event.change.clone()));

    store.replace_all(vec![task("1", "Task 1", None)]);
    store.add(task("2", "Task 2", None)).unwrap();
    store.remove("1");

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            StoreChange::ReplacedAll { count: 1 },
            StoreChange::Added { id: "2".into() },
            StoreChange::Removed { id: "1".into() },
        ]
    );
}
