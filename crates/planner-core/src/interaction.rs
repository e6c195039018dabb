use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::datetime::{add_days, days_between};
use crate::editor::TaskDraft;
use crate::store::{Persistence, TaskStore};
use crate::task::{Task, TaskId, TaskPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

impl FromStr for Edge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Ok(Edge::Left),
            "right" | "end" => Ok(Edge::Right),
            other => Err(anyhow!("unknown edge: {other} (expected left or right)")),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Left => f.write_str("left"),
            Edge::Right => f.write_str("right"),
        }
    }
}

/// Cells swept by a selection gesture. `end` may precede `start` until commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SelectionRange {
    pub fn normalized(&self) -> (NaiveDate, NaiveDate) {
        if self.end < self.start {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        let (first, last) = self.normalized();
        day >= first && day <= last
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeState {
    pub task_id: TaskId,
    pub edge: Edge,
}

/// The single active gesture. Holding one variant at a time keeps selection,
/// dragging and resizing mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Gesture {
    #[default]
    Idle,
    Selecting(SelectionRange),
    Dragging(TaskId),
    Resizing(ResizeState),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Nothing,
    /// A finished selection; the editor should open with this draft.
    Draft(TaskDraft),
    Updated(TaskId),
}

/// Serializes the task as it is when the drag begins.
pub fn encode_drag_payload(task: &Task) -> anyhow::Result<String> {
    serde_json::to_string(task).context("failed to encode drag payload")
}

pub fn decode_drag_payload(raw: &str) -> anyhow::Result<Task> {
    serde_json::from_str(raw).context("failed to decode drag payload")
}

/// Moves the whole range so it starts on `drop_day`, keeping its length.
pub fn moved_range(snapshot: &Task, drop_day: NaiveDate) -> (NaiveDate, NaiveDate) {
    let duration = days_between(snapshot.start_date, snapshot.effective_end());
    (drop_day, add_days(drop_day, duration))
}

/// One resize step; the result always satisfies `start <= end`.
pub fn resized_range(
    start: NaiveDate,
    end: NaiveDate,
    edge: Edge,
    day: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    match edge {
        Edge::Left => {
            if day <= end {
                (day, end)
            } else {
                (end, end)
            }
        }
        Edge::Right => {
            if day >= start {
                (start, day)
            } else {
                let new_start = day;
                let new_end = if end < new_start { new_start } else { end };
                (new_start, new_end)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    gesture: Gesture,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn selection(&self) -> Option<&SelectionRange> {
        match &self.gesture {
            Gesture::Selecting(range) => Some(range),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Starts a selection. A leftover gesture whose pointer-up was never seen
    /// is discarded first; a leftover resize swallows this press.
    #[instrument(skip(self))]
    pub fn pointer_down_cell(&mut self, day: NaiveDate) {
        match &self.gesture {
            Gesture::Resizing(state) => {
                warn!(id = %state.task_id, edge = %state.edge, "stale resize reset by cell press");
                self.gesture = Gesture::Idle;
                return;
            }
            Gesture::Selecting(_) | Gesture::Dragging(_) => {
                debug!("stale gesture reset by cell press");
            }
            Gesture::Idle => {}
        }

        self.gesture = Gesture::Selecting(SelectionRange {
            start: day,
            end: day,
        });
    }

    #[instrument(skip(self, store))]
    pub fn pointer_enter_cell<P: Persistence>(
        &mut self,
        day: NaiveDate,
        store: &mut TaskStore<P>,
    ) -> Outcome {
        match &mut self.gesture {
            Gesture::Selecting(range) => {
                range.end = day;
                Outcome::Nothing
            }
            Gesture::Resizing(state) => {
                let Some(task) = store.get(&state.task_id) else {
                    debug!(id = %state.task_id, "resized task vanished");
                    return Outcome::Nothing;
                };
                let (start, end) =
                    resized_range(task.start_date, task.effective_end(), state.edge, day);
                let id = state.task_id.clone();
                if store.update(&id, TaskPatch::range(start, end)) {
                    Outcome::Updated(id)
                } else {
                    Outcome::Nothing
                }
            }
            Gesture::Idle | Gesture::Dragging(_) => Outcome::Nothing,
        }
    }

    /// Ends a selection or resize gesture.
    #[instrument(skip(self))]
    pub fn pointer_up(&mut self) -> Outcome {
        match std::mem::take(&mut self.gesture) {
            Gesture::Selecting(range) => {
                let (start, end) = range.normalized();
                debug!(%start, %end, "selection committed");
                Outcome::Draft(TaskDraft::for_range(start, end))
            }
            Gesture::Resizing(state) => {
                debug!(id = %state.task_id, "resize finished");
                Outcome::Nothing
            }
            dragging @ Gesture::Dragging(_) => {
                // the drag ends with a drop or drag-end, not a pointer release
                self.gesture = dragging;
                Outcome::Nothing
            }
            Gesture::Idle => Outcome::Nothing,
        }
    }

    /// Grabs a task edge. Any selection in progress is dropped.
    #[instrument(skip(self), fields(id = %task_id))]
    pub fn pointer_down_handle(&mut self, task_id: TaskId, edge: Edge) {
        if let Gesture::Selecting(range) = &self.gesture {
            debug!(start = %range.start, end = %range.end, "selection cleared by resize");
        }
        self.gesture = Gesture::Resizing(ResizeState { task_id, edge });
    }

    /// Begins dragging `task`; the returned payload carries its current record.
    #[instrument(skip(self, task), fields(id = %task.id))]
    pub fn drag_start(&mut self, task: &Task) -> anyhow::Result<String> {
        let payload = encode_drag_payload(task)?;
        self.gesture = Gesture::Dragging(task.id.clone());
        Ok(payload)
    }

    /// Drag ended without a drop.
    pub fn drag_end(&mut self) {
        if matches!(self.gesture, Gesture::Dragging(_)) {
            self.gesture = Gesture::Idle;
        }
    }

    /// Applies a drop. A missing or unreadable payload is ignored.
    #[instrument(skip(self, payload, store))]
    pub fn drop_on<P: Persistence>(
        &mut self,
        day: NaiveDate,
        payload: Option<&str>,
        store: &mut TaskStore<P>,
    ) -> Outcome {
        if matches!(self.gesture, Gesture::Dragging(_)) {
            self.gesture = Gesture::Idle;
        }

        let Some(raw) = payload else {
            warn!("drop without payload ignored");
            return Outcome::Nothing;
        };
        let snapshot = match decode_drag_payload(raw) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "malformed drop payload ignored");
                return Outcome::Nothing;
            }
        };

        let (start, end) = moved_range(&snapshot, day);
        debug!(id = %snapshot.id, %start, %end, "moving task");
        if !store.update(&snapshot.id, TaskPatch::range(start, end)) {
            debug!(id = %snapshot.id, "dropped task no longer exists");
            return Outcome::Nothing;
        }
        Outcome::Updated(snapshot.id)
    }

    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::task::{NewTask, Status};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn store_with(start: NaiveDate, end: Option<NaiveDate>) -> (TaskStore<MemoryStore>, Task) {
        let mut store = TaskStore::open(MemoryStore::default());
        let task = store.create(NewTask {
            title: "task".to_string(),
            status: Status::ToDo,
            start_date: start,
            end_date: end,
        });
        (store, task)
    }

    #[test]
    fn reverse_selection_commits_normalized_draft() {
        let (mut store, _) = store_with(date(2024, 6, 1), None);
        let mut ctl = InteractionController::new();

        ctl.pointer_down_cell(date(2024, 6, 5));
        ctl.pointer_enter_cell(date(2024, 6, 4), &mut store);
        ctl.pointer_enter_cell(date(2024, 6, 3), &mut store);
        assert!(ctl.selection().expect("selecting").contains(date(2024, 6, 4)));

        let Outcome::Draft(draft) = ctl.pointer_up() else {
            panic!("expected a draft");
        };
        assert_eq!(draft.id, None);
        assert_eq!(draft.title, "");
        assert_eq!(draft.status, Status::ToDo);
        assert_eq!(draft.start_date, Some(date(2024, 6, 3)));
        assert_eq!(draft.end_date, Some(date(2024, 6, 5)));
        assert!(ctl.is_idle());
    }

    #[test]
    fn resize_handle_clears_selection() {
        let (mut store, task) = store_with(date(2024, 6, 10), Some(date(2024, 6, 12)));
        let mut ctl = InteractionController::new();

        ctl.pointer_down_cell(date(2024, 6, 1));
        ctl.pointer_enter_cell(date(2024, 6, 2), &mut store);
        ctl.pointer_down_handle(task.id.clone(), Edge::Right);

        assert_eq!(ctl.selection(), None);
        assert_eq!(
            ctl.gesture(),
            &Gesture::Resizing(ResizeState {
                task_id: task.id.clone(),
                edge: Edge::Right,
            })
        );

        // releasing does not produce a selection draft
        assert_eq!(ctl.pointer_up(), Outcome::Nothing);
    }

    #[test]
    fn cell_press_during_resize_does_not_select() {
        let (_, task) = store_with(date(2024, 6, 10), None);
        let mut ctl = InteractionController::new();

        ctl.pointer_down_handle(task.id.clone(), Edge::Left);
        ctl.pointer_down_cell(date(2024, 6, 3));
        assert!(ctl.is_idle());

        ctl.pointer_down_cell(date(2024, 6, 3));
        assert!(ctl.selection().is_some());
    }

    #[test]
    fn new_press_resets_stale_selection() {
        let (mut store, _) = store_with(date(2024, 6, 10), None);
        let mut ctl = InteractionController::new();

        ctl.pointer_down_cell(date(2024, 6, 1));
        ctl.pointer_enter_cell(date(2024, 6, 4), &mut store);
        // pointer-up lost outside the window
        ctl.pointer_down_cell(date(2024, 6, 20));

        assert_eq!(
            ctl.selection(),
            Some(&SelectionRange {
                start: date(2024, 6, 20),
                end: date(2024, 6, 20),
            })
        );
    }

    #[test]
    fn resize_gesture_updates_store_each_step() {
        let (mut store, task) = store_with(date(2024, 6, 10), Some(date(2024, 6, 12)));
        let mut ctl = InteractionController::new();

        ctl.pointer_down_handle(task.id.clone(), Edge::Right);
        ctl.pointer_enter_cell(date(2024, 6, 15), &mut store);
        let outcome = ctl.pointer_enter_cell(date(2024, 6, 16), &mut store);
        assert_eq!(outcome, Outcome::Updated(task.id.clone()));
        ctl.pointer_up();

        let after = store.get(&task.id).expect("task");
        assert_eq!(after.start_date, date(2024, 6, 10));
        assert_eq!(after.end_date, Some(date(2024, 6, 16)));
        assert!(ctl.is_idle());

        ctl.pointer_down_handle(task.id.clone(), Edge::Left);
        ctl.pointer_enter_cell(date(2024, 6, 20), &mut store);
        ctl.pointer_up();
        let after = store.get(&task.id).expect("task");
        assert_eq!(after.start_date, date(2024, 6, 16));
        assert_eq!(after.end_date, Some(date(2024, 6, 16)));
    }

    #[test]
    fn resize_policy_per_edge() {
        let start = date(2024, 6, 10);
        let end = date(2024, 6, 12);

        assert_eq!(
            resized_range(start, end, Edge::Left, date(2024, 6, 8)),
            (date(2024, 6, 8), end)
        );
        assert_eq!(
            resized_range(start, end, Edge::Left, date(2024, 6, 14)),
            (end, end)
        );
        assert_eq!(
            resized_range(start, end, Edge::Right, date(2024, 6, 11)),
            (start, date(2024, 6, 11))
        );
        assert_eq!(
            resized_range(start, end, Edge::Right, date(2024, 6, 7)),
            (date(2024, 6, 7), end)
        );
    }

    #[test]
    fn any_resize_sequence_keeps_start_before_end() {
        let (mut store, task) = store_with(date(2024, 6, 10), Some(date(2024, 6, 12)));
        let mut ctl = InteractionController::new();
        let origin = date(2024, 6, 1);

        for step in 0..60_i64 {
            let edge = if step % 3 == 0 { Edge::Left } else { Edge::Right };
            ctl.pointer_down_handle(task.id.clone(), edge);
            let day = add_days(origin, (step * 7) % 23);
            ctl.pointer_enter_cell(day, &mut store);
            ctl.pointer_enter_cell(add_days(day, -(step % 5)), &mut store);
            ctl.pointer_up();

            let current = store.get(&task.id).expect("task");
            assert!(current.start_date <= current.effective_end());
        }
    }

    #[test]
    fn drop_preserves_duration_from_snapshot() {
        let (mut store, task) = store_with(date(2024, 5, 1), Some(date(2024, 5, 3)));
        let mut ctl = InteractionController::new();

        let payload = ctl.drag_start(&task).expect("payload");
        // an edit lands while the drag is in flight
        store.update(&task.id, TaskPatch::range(date(2024, 5, 1), date(2024, 5, 20)));

        let outcome = ctl.drop_on(date(2024, 5, 10), Some(&payload), &mut store);
        assert_eq!(outcome, Outcome::Updated(task.id.clone()));

        let moved = store.get(&task.id).expect("task");
        assert_eq!(moved.start_date, date(2024, 5, 10));
        assert_eq!(moved.end_date, Some(date(2024, 5, 12)));
        assert!(ctl.is_idle());
    }

    #[test]
    fn drop_of_deleted_task_reports_nothing() {
        let (mut store, task) = store_with(date(2024, 5, 1), Some(date(2024, 5, 3)));
        let mut ctl = InteractionController::new();

        let payload = ctl.drag_start(&task).expect("payload");
        store.delete(&task.id);
        let saves = store.persistence().saves;

        let outcome = ctl.drop_on(date(2024, 5, 10), Some(&payload), &mut store);
        assert_eq!(outcome, Outcome::Nothing);
        assert!(store.tasks().is_empty());
        assert_eq!(store.persistence().saves, saves);
        assert!(ctl.is_idle());
    }

    #[test]
    fn single_day_task_moves_as_single_day() {
        let (_, task) = store_with(date(2024, 5, 1), None);
        assert_eq!(
            moved_range(&task, date(2024, 5, 9)),
            (date(2024, 5, 9), date(2024, 5, 9))
        );
    }

    #[test]
    fn missing_or_malformed_payload_is_ignored() {
        let (mut store, task) = store_with(date(2024, 5, 1), Some(date(2024, 5, 3)));
        let mut ctl = InteractionController::new();
        let saves = store.persistence().saves;

        assert_eq!(ctl.drop_on(date(2024, 5, 9), None, &mut store), Outcome::Nothing);
        assert_eq!(
            ctl.drop_on(date(2024, 5, 9), Some("{not json"), &mut store),
            Outcome::Nothing
        );
        assert_eq!(store.get(&task.id), Some(&task));
        assert_eq!(store.persistence().saves, saves);
    }

    #[test]
    fn pointer_up_does_not_end_drag() {
        let (_, task) = store_with(date(2024, 5, 1), None);
        let mut ctl = InteractionController::new();
        ctl.drag_start(&task).expect("payload");

        assert_eq!(ctl.pointer_up(), Outcome::Nothing);
        assert_eq!(ctl.gesture(), &Gesture::Dragging(task.id.clone()));

        ctl.drag_end();
        assert!(ctl.is_idle());
    }
}
