use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::store::{Persistence, TaskStore};
use crate::task::{NewTask, Status, Task, TaskId, TaskPatch};

/// What the task form is showing: an existing task, or a new one when `id`
/// is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: Option<TaskId>,
    pub title: String,
    pub status: Status,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn blank() -> Self {
        Self {
            id: None,
            title: String::new(),
            status: Status::ToDo,
            start_date: None,
            end_date: None,
        }
    }

    pub fn for_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            ..Self::blank()
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id.clone()),
            title: task.title.clone(),
            status: task.status,
            start_date: Some(task.start_date),
            end_date: task.end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    Save(TaskDraft),
    /// Only offered for drafts of existing tasks.
    Delete(TaskId),
    Cancel,
}

impl EditorOutcome {
    pub fn delete(draft: &TaskDraft) -> Option<Self> {
        draft.id.clone().map(EditorOutcome::Delete)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Committed {
    Created(Task),
    Updated(TaskId),
    Deleted(TaskId),
    Discarded,
}

/// Routes the form result to the store: saves create or update depending on
/// the draft id.
#[instrument(skip(store, outcome))]
pub fn commit<P: Persistence>(store: &mut TaskStore<P>, outcome: EditorOutcome) -> Committed {
    match outcome {
        EditorOutcome::Cancel => Committed::Discarded,
        EditorOutcome::Delete(id) => {
            store.delete(&id);
            Committed::Deleted(id)
        }
        EditorOutcome::Save(draft) => {
            let Some(start_date) = draft.start_date else {
                warn!(title = %draft.title, "draft without start date not saved");
                return Committed::Discarded;
            };

            match draft.id {
                Some(id) => {
                    store.update(
                        &id,
                        TaskPatch {
                            title: Some(draft.title),
                            status: Some(draft.status),
                            start_date: Some(start_date),
                            end_date: Some(draft.end_date),
                        },
                    );
                    Committed::Updated(id)
                }
                None => {
                    let task = store.create(NewTask {
                        title: draft.title,
                        status: draft.status,
                        start_date,
                        end_date: draft.end_date,
                    });
                    info!(id = %task.id, "task saved from editor");
                    Committed::Created(task)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_draft_creates_task() {
        let mut store = TaskStore::open(MemoryStore::default());
        let mut draft = TaskDraft::for_range(date(2024, 6, 3), date(2024, 6, 5));
        draft.title = "Offsite".to_string();

        let Committed::Created(task) = commit(&mut store, EditorOutcome::Save(draft)) else {
            panic!("expected create");
        };
        assert_eq!(task.title, "Offsite");
        assert_eq!(task.status, Status::ToDo);
        assert_eq!(task.start_date, date(2024, 6, 3));
        assert_eq!(task.end_date, Some(date(2024, 6, 5)));
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn existing_draft_updates_in_place() {
        let mut store = TaskStore::open(MemoryStore::default());
        let task = store.create(NewTask {
            title: "Before".to_string(),
            status: Status::ToDo,
            start_date: date(2024, 6, 3),
            end_date: Some(date(2024, 6, 5)),
        });

        let mut draft = TaskDraft::from(&task);
        draft.title = "After".to_string();
        draft.status = Status::Completed;
        draft.end_date = None;

        assert_eq!(
            commit(&mut store, EditorOutcome::Save(draft)),
            Committed::Updated(task.id.clone())
        );
        let updated = store.get(&task.id).expect("task");
        assert_eq!(updated.title, "After");
        assert_eq!(updated.status, Status::Completed);
        assert_eq!(updated.end_date, None);
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn reversed_draft_range_is_swapped() {
        let mut store = TaskStore::open(MemoryStore::default());
        let draft = TaskDraft::for_range(date(2024, 6, 9), date(2024, 6, 2));
        let Committed::Created(task) = commit(&mut store, EditorOutcome::Save(draft)) else {
            panic!("expected create");
        };
        assert_eq!(task.start_date, date(2024, 6, 2));
        assert_eq!(task.end_date, Some(date(2024, 6, 9)));
    }

    #[test]
    fn blank_draft_without_dates_is_discarded() {
        let mut store = TaskStore::open(MemoryStore::default());
        assert_eq!(
            commit(&mut store, EditorOutcome::Save(TaskDraft::blank())),
            Committed::Discarded
        );
        assert!(store.tasks().is_empty());
        assert_eq!(store.persistence().saves, 0);
    }

    #[test]
    fn delete_only_offered_for_existing_tasks() {
        let mut store = TaskStore::open(MemoryStore::default());
        assert_eq!(EditorOutcome::delete(&TaskDraft::blank()), None);

        let task = store.create(NewTask {
            title: "Gone".to_string(),
            status: Status::Review,
            start_date: date(2024, 6, 3),
            end_date: None,
        });
        let outcome = EditorOutcome::delete(&TaskDraft::from(&task)).expect("delete offered");
        assert_eq!(commit(&mut store, outcome), Committed::Deleted(task.id));
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn cancel_changes_nothing() {
        let mut store = TaskStore::open(MemoryStore::default());
        assert_eq!(commit(&mut store, EditorOutcome::Cancel), Committed::Discarded);
        assert_eq!(store.persistence().saves, 0);
    }
}
