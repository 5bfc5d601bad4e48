//! Two-task training pipeline
//!
//! ```text
//! load_and_split_data ──> train_and_log_model
//! ```
//!
//! Tasks run sequentially in the calling thread. Each gets a [`TaskRun`]
//! record; the first failure aborts the flow. [`TrainingPipeline::execute`]
//! keeps the task records on both paths, [`TrainingPipeline::run`] returns
//! the failing task's error unchanged.

use crate::dataset::Dataset;
use crate::experiment::RunLogger;
use crate::training::{PreparedData, Trainer, TrainingOutcome};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// First task: load, separate the target, split
pub const LOAD_AND_SPLIT_DATA: &str = "load_and_split_data";
/// Second task: fit, evaluate, log
pub const TRAIN_AND_LOG_MODEL: &str = "train_and_log_model";

/// Lifecycle of one task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Not started
    Pending,
    /// In progress
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
}

/// Execution record of one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRun {
    name: String,
    state: TaskState,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl TaskRun {
    /// New pending task
    #[must_use]
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: TaskState::Pending,
            started_at: None,
            ended_at: None,
            error: None,
        }
    }

    /// Task name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// When the task started running
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the task reached a terminal state
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Error message if the task failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn start(&mut self) {
        self.state = TaskState::Running;
        self.started_at = Some(Utc::now());
    }

    fn finish(&mut self, error: Option<String>) {
        self.state = if error.is_some() {
            TaskState::Failed
        } else {
            TaskState::Completed
        };
        self.ended_at = Some(Utc::now());
        self.error = error;
    }
}

/// Result of a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Validation RMSE of the logged model
    pub validation_rmse: f64,
    /// Training result of the second task
    pub training: TrainingOutcome,
    /// Task records in execution order
    pub tasks: Vec<TaskRun>,
}

impl PipelineOutcome {
    /// Committed run id
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.training.run_id
    }
}

/// Task records of one pipeline execution, successful or not
#[derive(Debug)]
pub struct PipelineRun {
    /// Task records in execution order; tasks after a failure stay pending
    pub tasks: Vec<TaskRun>,
    /// Result of the last task that ran
    pub result: Result<TrainingOutcome>,
}

impl PipelineRun {
    /// The task that failed, if any
    #[must_use]
    pub fn failed_task(&self) -> Option<&TaskRun> {
        self.tasks.iter().find(|t| t.state() == TaskState::Failed)
    }

    /// Successful outcome, or the failing task's error
    ///
    /// # Errors
    /// Returns the error of the first failing task
    pub fn into_outcome(self) -> Result<PipelineOutcome> {
        let training = self.result?;
        Ok(PipelineOutcome {
            validation_rmse: training.rmse,
            training,
            tasks: self.tasks,
        })
    }
}

/// Sequential load/train flow around a [`Trainer`]
#[derive(Debug, Clone, Default)]
pub struct TrainingPipeline {
    trainer: Trainer,
}

impl TrainingPipeline {
    /// Pipeline around `trainer`
    #[must_use]
    pub const fn new(trainer: Trainer) -> Self {
        Self { trainer }
    }

    /// Run both tasks against the dataset at `data_path`
    ///
    /// # Errors
    /// Returns the error of the first failing task
    pub fn run<L: RunLogger + ?Sized>(
        &self,
        data_path: impl AsRef<Path>,
        logger: &mut L,
    ) -> Result<PipelineOutcome> {
        self.execute(data_path, logger).into_outcome()
    }

    /// Run both tasks and keep every task record, including a failed one
    pub fn execute<L: RunLogger + ?Sized>(
        &self,
        data_path: impl AsRef<Path>,
        logger: &mut L,
    ) -> PipelineRun {
        let data_path = data_path.as_ref();
        let span = tracing::info_span!("training_pipeline", data_path = %data_path.display());
        let _guard = span.enter();

        let mut tasks = vec![
            TaskRun::pending(LOAD_AND_SPLIT_DATA),
            TaskRun::pending(TRAIN_AND_LOG_MODEL),
        ];

        let result = run_task(&mut tasks[0], || {
            let dataset = Dataset::load(data_path)?;
            self.trainer.prepare(&dataset)
        })
        .and_then(|prepared: PreparedData| {
            run_task(&mut tasks[1], || self.trainer.fit_and_log(prepared, logger))
        });

        PipelineRun { tasks, result }
    }
}

fn run_task<T>(task: &mut TaskRun, body: impl FnOnce() -> Result<T>) -> Result<T> {
    let span = tracing::info_span!("task", name = %task.name);
    let _guard = span.enter();

    task.start();
    tracing::info!("task started");
    match body() {
        Ok(value) => {
            task.finish(None);
            tracing::info!("task completed");
            Ok(value)
        }
        Err(e) => {
            task.finish(Some(e.to_string()));
            tracing::error!(error = %e, "task failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::ExperimentStore;
    use crate::training::Hyperparameters;
    use crate::Error;
    use std::io::Write;

    fn write_csv(rows: usize) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "feature_1,feature_2,RUL").unwrap();
        for i in 0..rows {
            writeln!(file, "{},{},{}", i, i % 3, 100 - i).unwrap();
        }
        file
    }

    fn pipeline() -> TrainingPipeline {
        TrainingPipeline::new(Trainer::new(Hyperparameters {
            n_estimators: 5,
            ..Hyperparameters::default()
        }))
    }

    #[test]
    fn test_pipeline_runs_both_tasks() {
        let csv = write_csv(30);
        let mut store = ExperimentStore::new();
        let outcome = pipeline().run(csv.path(), &mut store).unwrap();

        let names: Vec<&str> = outcome.tasks.iter().map(TaskRun::name).collect();
        assert_eq!(names, [LOAD_AND_SPLIT_DATA, TRAIN_AND_LOG_MODEL]);
        assert!(outcome
            .tasks
            .iter()
            .all(|t| t.state() == TaskState::Completed && t.ended_at().is_some()));
        assert!(outcome.validation_rmse.is_finite());
        assert!(store.get_run(outcome.run_id()).is_some());
    }

    #[test]
    fn test_missing_file_aborts_before_training() {
        let mut store = ExperimentStore::new();
        let err = pipeline()
            .run("/nonexistent/maintenance.csv", &mut store)
            .unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_failed_execution_keeps_task_records() {
        let csv = write_csv(1);
        let mut store = ExperimentStore::new();
        let run = pipeline().execute(csv.path(), &mut store);

        let failed = run.failed_task().unwrap();
        assert_eq!(failed.name(), LOAD_AND_SPLIT_DATA);
        assert!(failed.error().unwrap().contains("at least 2"));
        assert!(failed.ended_at().is_some());
        assert_eq!(run.tasks[1].state(), TaskState::Pending);
        assert!(run.tasks[1].started_at().is_none());

        assert!(matches!(
            run.into_outcome(),
            Err(Error::InsufficientRows { rows: 1, .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_successful_execution_has_no_failed_task() {
        let csv = write_csv(30);
        let mut store = ExperimentStore::new();
        let run = pipeline().execute(csv.path(), &mut store);

        assert!(run.failed_task().is_none());
        let outcome = run.into_outcome().unwrap();
        assert_eq!(outcome.tasks.len(), 2);
    }

    #[test]
    fn test_task_run_failure_state() {
        let mut task = TaskRun::pending("t");
        assert_eq!(task.state(), TaskState::Pending);
        let result: Result<()> = run_task(&mut task, || Err(Error::Computation("boom".into())));
        assert!(result.is_err());
        assert_eq!(task.state(), TaskState::Failed);
        assert!(task.error().unwrap().contains("boom"));
    }
}
