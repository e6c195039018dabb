use tracing::trace;

use crate::datetime::days_between;
use crate::grid::{
  CalendarWeek,
  MonthGrid
};
use crate::task::Task;

/// A task clipped to one week and placed
/// on a visual row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedTask {
  pub task:   Task,
  /// Day index within the week where the
  /// clipped range starts.
  pub offset: usize,
  /// Days covered inside the week.
  pub length: usize,
  pub row:    usize
}

impl PositionedTask {
  #[must_use]
  pub fn end(&self) -> usize {
    self.offset + self.length
  }

  #[must_use]
  pub fn overlaps(
    &self,
    other: &PositionedTask
  ) -> bool {
    self.offset < other.end()
      && self.end() > other.offset
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekLayout {
  pub week:      CalendarWeek,
  pub tasks:     Vec<PositionedTask>,
  pub row_count: usize
}

/// Clips every task intersecting `week`
/// and orders them by offset. Ties keep
/// the input order. Rows are left at 0.
#[tracing::instrument(skip(week, tasks), fields(week_start = %week.start()))]
pub fn project_week(
  week: &CalendarWeek,
  tasks: &[Task]
) -> Vec<PositionedTask> {
  let week_start = week.start();
  let week_end = week.end();

  let mut projected = tasks
    .iter()
    .filter(|task| {
      task.effective_end() >= week_start
        && task.start_date <= week_end
    })
    .map(|task| {
      let adjusted_start =
        task.start_date.max(week_start);
      let adjusted_end =
        task.effective_end().min(week_end);
      let offset = days_between(
        week_start,
        adjusted_start
      ) as usize;
      let length = days_between(
        adjusted_start,
        adjusted_end
      ) as usize
        + 1;
      PositionedTask {
        task: task.clone(),
        offset,
        length,
        row: 0
      }
    })
    .collect::<Vec<_>>();

  // sort_by_key is stable
  projected.sort_by_key(|p| p.offset);
  projected
}

/// First-fit row assignment: each task
/// goes to the lowest row holding nothing
/// it overlaps. Returns the row count.
#[tracing::instrument(skip(tasks))]
pub fn pack_rows(
  tasks: &mut [PositionedTask]
) -> usize {
  let mut rows: Vec<
    Vec<(usize, usize)>
  > = Vec::new();

  for task in tasks.iter_mut() {
    let span = (task.offset, task.end());
    let free = rows.iter().position(
      |placed| {
        !placed.iter().any(
          |&(start, end)| {
            span.0 < end && span.1 > start
          }
        )
      }
    );

    let row = match free {
      | Some(row) => row,
      | None => {
        rows.push(Vec::new());
        rows.len() - 1
      }
    };
    rows[row].push(span);
    task.row = row;

    trace!(
      id = %task.task.id,
      offset = task.offset,
      length = task.length,
      row,
      "placed task"
    );
  }

  rows.len()
}

#[must_use]
pub fn layout_week(
  week: &CalendarWeek,
  tasks: &[Task]
) -> WeekLayout {
  let mut projected =
    project_week(week, tasks);
  let row_count =
    pack_rows(&mut projected);
  WeekLayout {
    week: *week,
    tasks: projected,
    row_count
  }
}

/// Projects and packs the already
/// filtered tasks onto every week of the
/// grid.
#[tracing::instrument(skip(grid, tasks), fields(month = %grid.month()))]
pub fn layout_month(
  grid: &MonthGrid,
  tasks: &[Task]
) -> Vec<WeekLayout> {
  grid
    .weeks()
    .iter()
    .map(|week| layout_week(week, tasks))
    .collect()
}
