use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::trace;

use crate::datetime::add_days;
use crate::task::{
  Status,
  Task
};

/// Time window presets offered by the
/// planner, in weeks.
pub const TIME_WINDOW_PRESETS: [u32; 3] =
  [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
  pub statuses:     BTreeSet<Status>,
  pub search:       String,
  pub within_weeks: Option<u32>
}

impl Default for TaskFilter {
  fn default() -> Self {
    Self {
      statuses:     Status::ALL
        .into_iter()
        .collect(),
      search:       String::new(),
      within_weeks: None
    }
  }
}

impl TaskFilter {
  /// Removes `status` from the selection
  /// if present, adds it otherwise.
  pub fn toggle_status(
    &mut self,
    status: Status
  ) {
    if !self.statuses.remove(&status) {
      self.statuses.insert(status);
    }
  }

  #[must_use]
  pub fn matches(
    &self,
    task: &Task,
    today: NaiveDate
  ) -> bool {
    if !self
      .statuses
      .contains(&task.status)
    {
      return false;
    }

    if !self.search.is_empty()
      && !task
        .title
        .to_lowercase()
        .contains(
          &self.search.to_lowercase()
        )
    {
      return false;
    }

    if let Some(weeks) = self.within_weeks
    {
      let window_end = add_days(
        today,
        i64::from(weeks) * 7
      );
      // Only the start date is checked;
      // a long task begun before today
      // falls outside the window.
      if task.start_date < today
        || task.start_date >= window_end
      {
        return false;
      }
    }

    true
  }

  /// Keeps matching tasks in their
  /// original order.
  #[tracing::instrument(skip(
    self, tasks
  ))]
  pub fn apply(
    &self,
    tasks: &[Task],
    today: NaiveDate
  ) -> Vec<Task> {
    let kept = tasks
      .iter()
      .filter(|task| {
        self.matches(task, today)
      })
      .cloned()
      .collect::<Vec<_>>();

    trace!(
      total = tasks.len(),
      kept = kept.len(),
      search = %self.search,
      within_weeks = ?self.within_weeks,
      "filtered tasks"
    );
    kept
  }
}
