use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Review")]
    Review,
    #[serde(rename = "Completed")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::Review,
        Status::Completed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::Review => "Review",
            Status::Completed => "Completed",
        }
    }

    /// ANSI foreground code used by the renderer.
    pub fn ansi_color(self) -> &'static str {
        match self {
            Status::ToDo => "34",
            Status::InProgress => "33",
            Status::Review => "35",
            Status::Completed => "32",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|ch| !ch.is_whitespace() && *ch != '-' && *ch != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Status::ToDo),
            "inprogress" => Ok(Status::InProgress),
            "review" => Ok(Status::Review),
            "completed" | "done" => Ok(Status::Completed),
            _ => Err(anyhow!("unknown status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,

    #[serde(default)]
    pub title: String,

    pub status: Status,

    pub start_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl Task {
    /// The last day the task occupies; single-day tasks end where they start.
    pub fn effective_end(&self) -> NaiveDate {
        self.end_date.unwrap_or(self.start_date)
    }

    /// Restores `start_date <= end_date` by swapping a reversed range.
    pub fn normalize_range(&mut self) {
        if let Some(end) = self.end_date
            && end < self.start_date
        {
            self.end_date = Some(self.start_date);
            self.start_date = end;
        }
    }

    pub fn apply(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        self.normalize_range();
    }
}

/// Fields for a task that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub status: Status,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn into_task(self, id: TaskId) -> Task {
        let mut task = Task {
            id,
            title: self.title,
            status: self.status,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        task.normalize_range();
        task
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(Some(end)),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn record_shape_matches_wire_format() {
        let task = Task {
            id: TaskId::from("a1b2c3d"),
            title: "Write report".to_string(),
            status: Status::InProgress,
            start_date: date(2024, 3, 30),
            end_date: Some(date(2024, 4, 2)),
        };

        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "id": "a1b2c3d",
                "title": "Write report",
                "status": "In Progress",
                "startDate": "2024-03-30",
                "endDate": "2024-04-02"
            })
        );
    }

    #[test]
    fn missing_end_date_is_single_day() {
        let task: Task = serde_json::from_str(
            r#"{"id":"x","title":"Call","status":"To Do","startDate":"2024-06-01"}"#,
        )
        .expect("parse");
        assert_eq!(task.end_date, None);
        assert_eq!(task.effective_end(), date(2024, 6, 1));

        let json = serde_json::to_string(&task).expect("serialize");
        assert!(!json.contains("endDate"));
    }

    #[test]
    fn patch_keeps_range_ordered() {
        let mut task = NewTask {
            title: "Trip".to_string(),
            status: Status::ToDo,
            start_date: date(2024, 5, 1),
            end_date: Some(date(2024, 5, 3)),
        }
        .into_task(TaskId::from("t"));

        task.apply(TaskPatch {
            start_date: Some(date(2024, 5, 9)),
            ..TaskPatch::default()
        });
        assert_eq!(task.start_date, date(2024, 5, 3));
        assert_eq!(task.end_date, Some(date(2024, 5, 9)));

        task.apply(TaskPatch {
            end_date: Some(None),
            ..TaskPatch::default()
        });
        assert_eq!(task.effective_end(), task.start_date);
    }

    #[test]
    fn status_parses_loose_spellings() {
        assert_eq!("to do".parse::<Status>().expect("status"), Status::ToDo);
        assert_eq!(
            "in-progress".parse::<Status>().expect("status"),
            Status::InProgress
        );
        assert_eq!("Review".parse::<Status>().expect("status"), Status::Review);
        assert!("blocked".parse::<Status>().is_err());
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(TaskId::generate(), TaskId::generate());
    }
}
