use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::store::Persistence;
use crate::task::Task;

pub const TASKS_FILE: &str = "tasks.json";

/// The task collection as one JSON array on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    pub data_dir: PathBuf,
    pub tasks_path: PathBuf,
}

impl JsonFileStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        let tasks_path = data_dir.join(TASKS_FILE);

        info!(
            data_dir = %data_dir.display(),
            tasks = %tasks_path.display(),
            "opened datastore"
        );

        Ok(Self {
            data_dir,
            tasks_path,
        })
    }
}

impl Persistence for JsonFileStore {
    #[tracing::instrument(skip(self))]
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        if !self.tasks_path.exists() {
            debug!(file = %self.tasks_path.display(), "no task file yet");
            return Ok(Vec::new());
        }

        let raw = fs::read_to_string(&self.tasks_path)
            .with_context(|| format!("failed reading {}", self.tasks_path.display()))?;
        parse_records(&raw).with_context(|| format!("failed parsing {}", self.tasks_path.display()))
    }

    #[tracing::instrument(skip(self, tasks))]
    fn save(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        save_json_atomic(&self.tasks_path, tasks).context("failed to save tasks.json")
    }
}

/// Parses a JSON array of task records. Records that do not fit the task
/// shape are skipped; anything that is not an array is an error.
pub fn parse_records(raw: &str) -> anyhow::Result<Vec<Task>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let values: Vec<Value> = serde_json::from_str(raw)?;
    let mut out = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<Task>(value) {
            Ok(task) => out.push(task),
            Err(err) => warn!(index = idx, error = %err, "skipping malformed task record"),
        }
    }

    debug!(count = out.len(), "parsed task records");
    Ok(out)
}

#[tracing::instrument(skip(path, tasks))]
fn save_json_atomic(path: &Path, tasks: &[Task]) -> anyhow::Result<()> {
    debug!(file = %path.display(), count = tasks.len(), "saving json atomically");

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut temp, tasks)?;
    writeln!(temp)?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}
