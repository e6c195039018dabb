use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Datelike,
  Duration,
  Local,
  NaiveDate,
  Weekday
};
use tracing::warn;

pub const DATE_FORMAT: &str =
  "%Y-%m-%d";

/// Every grid week starts on this day.
pub const WEEK_START: Weekday =
  Weekday::Sun;

#[must_use]
pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

pub fn parse_date(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  let trimmed = raw.trim();
  if trimmed.eq_ignore_ascii_case("today")
  {
    return Ok(today());
  }
  NaiveDate::parse_from_str(
    trimmed,
    DATE_FORMAT
  )
  .with_context(|| {
    format!(
      "invalid date '{trimmed}', \
       expected YYYY-MM-DD"
    )
  })
}

/// Parses `YYYY-MM` into the first day
/// of that month.
pub fn parse_month(
  raw: &str
) -> anyhow::Result<NaiveDate> {
  let trimmed = raw.trim();
  let (year, month) = trimmed
    .split_once('-')
    .ok_or_else(|| {
      anyhow!(
        "invalid month '{trimmed}', \
         expected YYYY-MM"
      )
    })?;
  let year = year
    .parse::<i32>()
    .with_context(|| {
      format!("invalid year in '{trimmed}'")
    })?;
  let month = month
    .parse::<u32>()
    .with_context(|| {
      format!(
        "invalid month in '{trimmed}'"
      )
    })?;
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .ok_or_else(|| {
    anyhow!(
      "month out of range: '{trimmed}'"
    )
  })
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date.format(DATE_FORMAT).to_string()
}

/// Saturates at the ends of the
/// representable calendar.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  if let Some(shifted) = Duration::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
  {
    return shifted;
  }

  let bound = if days < 0 {
    NaiveDate::MIN
  } else {
    NaiveDate::MAX
  };
  warn!(
    %date,
    days,
    %bound,
    "date arithmetic overflowed; \
     clamping"
  );
  bound
}

/// Signed number of calendar days from
/// `from` to `to`.
#[must_use]
pub fn days_between(
  from: NaiveDate,
  to: NaiveDate
) -> i64 {
  to.signed_duration_since(from)
    .num_days()
}

#[must_use]
pub fn first_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn last_day_of_month(
  date: NaiveDate
) -> NaiveDate {
  let first = first_day_of_month(date);
  add_days(shift_months(first, 1), -1)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = WEEK_START
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

#[must_use]
pub fn end_of_week(
  day: NaiveDate
) -> NaiveDate {
  add_days(start_of_week(day), 6)
}

/// Moves by whole months, clamping the
/// day to the target month's length.
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let mut year = date.year();
  let mut month =
    date.month() as i32 + months;

  while month < 1 {
    month += 12;
    year = year.saturating_sub(1);
  }
  while month > 12 {
    month -= 12;
    year = year.saturating_add(1);
  }

  let month = month as u32;
  let day =
    date.day().min(days_in_month(
      year, month
    ));
  NaiveDate::from_ymd_opt(
    year, month, day
  )
  .unwrap_or(date)
}

fn days_in_month(
  year: i32,
  month: u32
) -> u32 {
  let (next_year, next_month) =
    if month >= 12 {
      (year.saturating_add(1), 1_u32)
    } else {
      (year, month + 1)
    };
  NaiveDate::from_ymd_opt(
    next_year, next_month, 1
  )
  .and_then(|first| first.pred_opt())
  .map(|last| last.day())
  .unwrap_or(28)
}
