use chrono::{
  Datelike,
  NaiveDate
};

use crate::datetime::{
  add_days,
  first_day_of_month,
  start_of_week
};

pub const WEEKS_PER_GRID: usize = 6;
pub const DAYS_PER_WEEK: usize = 7;

pub const WEEKDAY_LABELS: [&str;
  DAYS_PER_WEEK] = [
  "Sun", "Mon", "Tue", "Wed", "Thu",
  "Fri", "Sat"
];

/// Seven consecutive days starting on
/// Sunday.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct CalendarWeek {
  days: [NaiveDate; DAYS_PER_WEEK]
}

impl CalendarWeek {
  #[must_use]
  pub fn starting(
    start: NaiveDate
  ) -> Self {
    let mut days =
      [start; DAYS_PER_WEEK];
    for (idx, day) in
      days.iter_mut().enumerate()
    {
      *day = add_days(start, idx as i64);
    }
    Self {
      days
    }
  }

  #[must_use]
  pub fn start(&self) -> NaiveDate {
    self.days[0]
  }

  #[must_use]
  pub fn end(&self) -> NaiveDate {
    self.days[DAYS_PER_WEEK - 1]
  }

  #[must_use]
  pub fn days(
    &self
  ) -> &[NaiveDate; DAYS_PER_WEEK] {
    &self.days
  }

  #[must_use]
  pub fn contains(
    &self,
    day: NaiveDate
  ) -> bool {
    day >= self.start()
      && day <= self.end()
  }
}

/// The fixed 6x7 grid shown for one
/// month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
  month: NaiveDate,
  weeks: Vec<CalendarWeek>
}

impl MonthGrid {
  /// Builds the grid for the month
  /// containing `reference`.
  #[tracing::instrument]
  pub fn build(
    reference: NaiveDate
  ) -> Self {
    let month =
      first_day_of_month(reference);
    let grid_start =
      start_of_week(month);
    let weeks = (0..WEEKS_PER_GRID)
      .map(|row| {
        CalendarWeek::starting(add_days(
          grid_start,
          (row * DAYS_PER_WEEK) as i64
        ))
      })
      .collect::<Vec<_>>();

    tracing::trace!(
      month = %month,
      grid_start = %grid_start,
      "built month grid"
    );

    Self {
      month,
      weeks
    }
  }

  /// First day of the displayed month.
  #[must_use]
  pub fn month(&self) -> NaiveDate {
    self.month
  }

  #[must_use]
  pub fn weeks(
    &self
  ) -> &[CalendarWeek] {
    &self.weeks
  }

  pub fn days(
    &self
  ) -> impl Iterator<Item = NaiveDate> + '_
  {
    self
      .weeks
      .iter()
      .flat_map(|week| {
        week.days().iter().copied()
      })
  }

  #[must_use]
  pub fn first_day(&self) -> NaiveDate {
    self.weeks[0].start()
  }

  #[must_use]
  pub fn last_day(&self) -> NaiveDate {
    self.weeks[WEEKS_PER_GRID - 1].end()
  }

  #[must_use]
  pub fn in_month(
    &self,
    day: NaiveDate
  ) -> bool {
    day.year() == self.month.year()
      && day.month()
        == self.month.month()
  }

  #[must_use]
  pub fn title(&self) -> String {
    self
      .month
      .format("%B %Y")
      .to_string()
  }
}
