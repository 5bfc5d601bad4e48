//! Run Record - one training invocation within an experiment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run is executing and has not been committed.
    Running,
    /// Run was committed with all of its params, metrics and artifacts.
    Finished,
    /// Run failed before it could be committed.
    Failed,
}

/// Run Record tracks the lifecycle of a single run.
///
/// A run is `Running` from [`RunRecord::start`] until it is completed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunRecord {
    run_id: String,
    experiment_id: String,
    status: RunStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    /// Start a run with a fresh UUID.
    #[must_use]
    pub fn start(experiment_id: impl Into<String>) -> Self {
        Self::start_with_id(uuid::Uuid::new_v4().simple().to_string(), experiment_id)
    }

    /// Start a run with an explicit ID.
    #[must_use]
    pub fn start_with_id(run_id: impl Into<String>, experiment_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            experiment_id: experiment_id.into(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Get the run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the current run status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Get the start timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get the end timestamp, if the run has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// True once the run has been committed successfully.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == RunStatus::Finished
    }

    /// Complete the run with a terminal status and stamp `ended_at`.
    pub fn complete(&mut self, status: RunStatus) {
        self.status = status;
        self.ended_at = Some(Utc::now());
    }

    /// Override the end timestamp (useful for testing selection order).
    pub fn set_ended_at(&mut self, ended_at: DateTime<Utc>) {
        self.ended_at = Some(ended_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_starts_running() {
        let run = RunRecord::start("exp-1");
        assert_eq!(run.status(), RunStatus::Running);
        assert_eq!(run.run_id().len(), 32);
        assert!(run.ended_at().is_none());
    }

    #[test]
    fn test_run_lifecycle() {
        let mut run = RunRecord::start_with_id("run-1", "exp-1");
        run.complete(RunStatus::Finished);
        assert!(run.is_finished());
        assert!(run.ended_at().unwrap() >= run.started_at());
    }

    #[test]
    fn test_run_status_serialization() {
        let json = serde_json::to_string(&RunStatus::Finished).unwrap();
        assert_eq!(json, "\"FINISHED\"");
    }
}
