use std::fs;

use chrono::NaiveDate;
use planner_core::datastore::{JsonFileStore, TASKS_FILE};
use planner_core::editor::{Committed, EditorOutcome};
use planner_core::interaction::{Edge, Outcome};
use planner_core::planner::Planner;
use planner_core::store::{Persistence, TaskStore};
use planner_core::task::{Status, TaskId};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn gestures_persist_through_json_store() {
    let temp = tempdir().expect("tempdir");
    let file_store = JsonFileStore::open(temp.path()).expect("open datastore");
    let mut planner = Planner::new(TaskStore::open(file_store), date(2024, 6, 1));

    planner.pointer_down_cell(date(2024, 6, 5));
    planner.pointer_enter_cell(date(2024, 6, 3));
    let Outcome::Draft(mut draft) = planner.pointer_up() else {
        panic!("expected draft");
    };
    draft.title = "Conference".to_string();
    let Committed::Created(task) = planner.close_editor(EditorOutcome::Save(draft)) else {
        panic!("expected create");
    };

    let payload = planner
        .drag_start(&task.id)
        .expect("encode payload")
        .expect("known task");
    planner.drop_on(date(2024, 6, 10), Some(&payload));

    planner.pointer_down_handle(task.id.clone(), Edge::Right);
    planner.pointer_enter_cell(date(2024, 6, 14));
    planner.pointer_up();

    let reopened = JsonFileStore::open(temp.path()).expect("reopen datastore");
    let saved = reopened.load().expect("load");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].id, task.id);
    assert_eq!(saved[0].title, "Conference");
    assert_eq!(saved[0].status, Status::ToDo);
    assert_eq!(saved[0].start_date, date(2024, 6, 10));
    assert_eq!(saved[0].end_date, Some(date(2024, 6, 14)));

    let raw = fs::read_to_string(temp.path().join(TASKS_FILE)).expect("read file");
    assert!(raw.contains("\"startDate\": \"2024-06-10\""));
    assert!(raw.contains("\"status\": \"To Do\""));
}

#[test]
fn corrupt_file_falls_back_to_empty_collection() {
    let temp = tempdir().expect("tempdir");
    fs::write(temp.path().join(TASKS_FILE), "{{{ definitely not json").expect("write");

    let store = TaskStore::open(JsonFileStore::open(temp.path()).expect("open datastore"));
    assert!(store.tasks().is_empty());
}

#[test]
fn missing_file_is_empty_and_reversed_records_are_normalized() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(JsonFileStore::open(temp.path()).expect("open datastore"));
    assert!(store.tasks().is_empty());

    fs::write(
        temp.path().join(TASKS_FILE),
        r#"[{"id":"r1","title":"Backwards","status":"Review","startDate":"2024-06-09","endDate":"2024-06-02"}]"#,
    )
    .expect("write");
    let store = TaskStore::open(JsonFileStore::open(temp.path()).expect("open datastore"));
    let task = store.get(&TaskId::from("r1")).expect("task");
    assert_eq!(task.start_date, date(2024, 6, 2));
    assert_eq!(task.end_date, Some(date(2024, 6, 9)));
}

#[test]
fn stale_ids_are_ignored_end_to_end() {
    let temp = tempdir().expect("tempdir");
    let mut planner = Planner::new(
        TaskStore::open(JsonFileStore::open(temp.path()).expect("open datastore")),
        date(2024, 6, 1),
    );

    planner.pointer_down_handle(TaskId::from("ghost"), Edge::Left);
    assert_eq!(planner.pointer_enter_cell(date(2024, 6, 3)), Outcome::Nothing);
    planner.pointer_up();

    assert_eq!(
        planner.close_editor(EditorOutcome::Delete(TaskId::from("ghost"))),
        Committed::Deleted(TaskId::from("ghost"))
    );
    assert!(planner.store().tasks().is_empty());
    assert!(!temp.path().join(TASKS_FILE).exists());
}
