use tracing::{debug, error, info, instrument, warn};

use crate::task::{NewTask, Task, TaskId, TaskPatch};

/// Load/save of the whole task collection.
pub trait Persistence {
    fn load(&self) -> anyhow::Result<Vec<Task>>;

    fn save(&mut self, tasks: &[Task]) -> anyhow::Result<()>;
}

/// Keeps the collection in memory; `saves` counts writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub tasks: Vec<Task>,
    pub saves: usize,
}

impl MemoryStore {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks, saves: 0 }
    }
}

impl Persistence for MemoryStore {
    fn load(&self) -> anyhow::Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn save(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        self.tasks = tasks.to_vec();
        self.saves += 1;
        Ok(())
    }
}

/// Owns the authoritative task list. Every mutation is followed by a save.
#[derive(Debug)]
pub struct TaskStore<P> {
    tasks: Vec<Task>,
    persistence: P,
}

impl<P: Persistence> TaskStore<P> {
    #[instrument(skip(persistence))]
    pub fn open(persistence: P) -> Self {
        let tasks = match persistence.load() {
            Ok(mut tasks) => {
                for task in &mut tasks {
                    task.normalize_range();
                }
                info!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to load tasks; starting empty");
                Vec::new()
            }
        };

        Self { tasks, persistence }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create(&mut self, draft: NewTask) -> Task {
        let mut id = TaskId::generate();
        while self.get(&id).is_some() {
            id = TaskId::generate();
        }

        let task = draft.into_task(id);
        info!(id = %task.id, start = %task.start_date, end = ?task.end_date, "created task");
        self.tasks.push(task.clone());
        self.persist();
        task
    }

    /// Unknown ids are ignored.
    #[instrument(skip(self, patch), fields(id = %id))]
    pub fn update(&mut self, id: &TaskId, patch: TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|task| &task.id == id) else {
            debug!("update for unknown task ignored");
            return false;
        };

        task.apply(patch);
        debug!(start = %task.start_date, end = ?task.end_date, "updated task");
        self.persist();
        true
    }

    /// Unknown ids are ignored.
    #[instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: &TaskId) {
        let before = self.tasks.len();
        self.tasks.retain(|task| &task.id != id);
        if self.tasks.len() == before {
            debug!("delete for unknown task ignored");
            return;
        }

        info!("deleted task");
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(err) = self.persistence.save(&self.tasks) {
            error!(error = %format!("{err:#}"), "failed to save tasks");
        }
    }
}
