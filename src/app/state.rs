use crate::model::FetchMode;
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of one playlist task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    FlatFetched,
    Enriched,
    Saved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Fetch,
    Save(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub name: String,
    pub state: TaskState,
    pub mode: FetchMode,
    pub entries: usize,
    pub path: Option<PathBuf>,
    pub interrupted: bool,
    pub failure: Option<Failure>,
}

impl TaskOutcome {
    pub fn new(name: &str, mode: FetchMode) -> Self {
        Self {
            name: name.to_string(),
            state: TaskState::Pending,
            mode,
            entries: 0,
            path: None,
            interrupted: false,
            failure: None,
        }
    }

    pub fn advance(&mut self, state: TaskState) {
        log::debug!("{}: {:?} -> {:?}", self.name, self.state, state);
        self.state = state;
    }

    pub fn fail(&mut self, failure: Failure) {
        self.advance(TaskState::Failed);
        self.failure = Some(failure);
    }

    pub fn is_saved(&self) -> bool {
        self.state == TaskState::Saved
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.failure, &self.path) {
            (Some(Failure::Fetch), _) => write!(f, "✗ {}: failed to fetch", self.name),
            (Some(Failure::Save(reason)), _) => {
                write!(f, "✗ {}: failed to save ({})", self.name, reason)
            }
            (None, Some(path)) => {
                let partial = if self.interrupted { ", partial" } else { "" };
                write!(
                    f,
                    "✓ {}: {} items ({}{}) → {}",
                    self.name,
                    self.entries,
                    self.mode,
                    partial,
                    path.display()
                )
            }
            (None, None) => write!(f, "… {}: {:?}", self.name, self.state),
        }
    }
}

/// Everything the batch produced, in task order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
    pub total_tasks: usize,
}

impl BatchReport {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn interrupted(&self) -> bool {
        self.outcomes.iter().any(|o| o.interrupted)
    }

    pub fn summary(&self) -> String {
        format!("Done. {}/{} playlist(s) saved.", self.saved(), self.total_tasks)
    }
}
