use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::datetime::{first_day_of_month, shift_months};
use crate::editor::{self, Committed, EditorOutcome, TaskDraft};
use crate::filter::TaskFilter;
use crate::grid::MonthGrid;
use crate::interaction::{Edge, InteractionController, Outcome};
use crate::layout::{WeekLayout, layout_month};
use crate::store::{Persistence, TaskStore};
use crate::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub in_selection: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthView {
    pub title: String,
    /// 42 cells, row-major.
    pub cells: Vec<DayCell>,
    pub weeks: Vec<WeekLayout>,
}

/// Everything the month planner screen holds between events.
#[derive(Debug)]
pub struct Planner<P> {
    store: TaskStore<P>,
    filter: TaskFilter,
    controller: InteractionController,
    month: NaiveDate,
    today: NaiveDate,
    editor: Option<TaskDraft>,
}

impl<P: Persistence> Planner<P> {
    pub fn new(store: TaskStore<P>, today: NaiveDate) -> Self {
        Self {
            store,
            filter: TaskFilter::default(),
            controller: InteractionController::new(),
            month: first_day_of_month(today),
            today,
            editor: None,
        }
    }

    pub fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn store(&self) -> &TaskStore<P> {
        &self.store
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut TaskFilter {
        &mut self.filter
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    pub fn month(&self) -> NaiveDate {
        self.month
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn show_month(&mut self, day: NaiveDate) {
        self.month = first_day_of_month(day);
        debug!(month = %self.month, "showing month");
    }

    pub fn prev_month(&mut self) {
        self.show_month(shift_months(self.month, -1));
    }

    pub fn next_month(&mut self) {
        self.show_month(shift_months(self.month, 1));
    }

    pub fn go_to_today(&mut self) {
        self.show_month(self.today);
    }

    pub fn visible_tasks(&self) -> Vec<Task> {
        self.filter.apply(self.store.tasks(), self.today)
    }

    #[instrument(skip(self), fields(month = %self.month))]
    pub fn month_view(&self) -> MonthView {
        let grid = MonthGrid::build(self.month);
        let visible = self.visible_tasks();
        let selection = self.controller.selection();

        let cells = grid
            .days()
            .map(|date| DayCell {
                date,
                in_month: grid.in_month(date),
                is_today: date == self.today,
                in_selection: selection.is_some_and(|range| range.contains(date)),
            })
            .collect();

        MonthView {
            title: grid.title(),
            cells,
            weeks: layout_month(&grid, &visible),
        }
    }

    pub fn pointer_down_cell(&mut self, day: NaiveDate) {
        self.controller.pointer_down_cell(day);
    }

    pub fn pointer_enter_cell(&mut self, day: NaiveDate) -> Outcome {
        self.controller.pointer_enter_cell(day, &mut self.store)
    }

    /// A committed selection opens the editor with the selected range.
    pub fn pointer_up(&mut self) -> Outcome {
        let outcome = self.controller.pointer_up();
        if let Outcome::Draft(draft) = &outcome {
            self.editor = Some(draft.clone());
        }
        outcome
    }

    pub fn pointer_down_handle(&mut self, id: TaskId, edge: Edge) {
        self.controller.pointer_down_handle(id, edge);
    }

    /// Returns the drag payload, or `None` when the task is unknown.
    pub fn drag_start(&mut self, id: &TaskId) -> anyhow::Result<Option<String>> {
        let Some(task) = self.store.get(id).cloned() else {
            debug!(id = %id, "drag on unknown task ignored");
            return Ok(None);
        };
        self.controller.drag_start(&task).map(Some)
    }

    pub fn drag_end(&mut self) {
        self.controller.drag_end();
    }

    pub fn drop_on(&mut self, day: NaiveDate, payload: Option<&str>) -> Outcome {
        self.controller.drop_on(day, payload, &mut self.store)
    }

    pub fn editor(&self) -> Option<&TaskDraft> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut TaskDraft> {
        self.editor.as_mut()
    }

    pub fn open_new_task(&mut self) {
        self.editor = Some(TaskDraft::blank());
    }

    /// Opens the editor on an existing task. Returns false for unknown ids.
    pub fn open_task(&mut self, id: &TaskId) -> bool {
        match self.store.get(id) {
            Some(task) => {
                self.editor = Some(TaskDraft::from(task));
                true
            }
            None => false,
        }
    }

    #[instrument(skip(self, outcome))]
    pub fn close_editor(&mut self, outcome: EditorOutcome) -> Committed {
        self.editor = None;
        let committed = editor::commit(&mut self.store, outcome);
        info!(?committed, "editor closed");
        committed
    }
}
