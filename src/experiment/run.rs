//! Pending and committed runs

use super::{ArtifactRecord, MetricRecord, ParamRecord, RunRecord, RunStatus};
use serde::{Deserialize, Serialize};

/// A run being assembled in memory.
///
/// Nothing reaches a store until the run is handed to
/// [`RunLogger::log_run`](super::RunLogger::log_run), which commits params,
/// metrics and artifacts together.
#[derive(Debug)]
pub struct PendingRun {
    record: RunRecord,
    params: Vec<ParamRecord>,
    metrics: Vec<MetricRecord>,
    artifacts: Vec<PendingArtifact>,
}

/// Artifact bytes waiting to be written.
#[derive(Debug, Clone)]
pub struct PendingArtifact {
    /// Record describing the bytes
    pub record: ArtifactRecord,
    /// Content
    pub bytes: Vec<u8>,
}

impl PendingRun {
    /// Start a run under `experiment_id`.
    #[must_use]
    pub fn start(experiment_id: impl Into<String>) -> Self {
        Self::from_record(RunRecord::start(experiment_id))
    }

    /// Start from an existing (running) record.
    #[must_use]
    pub const fn from_record(record: RunRecord) -> Self {
        Self {
            record,
            params: Vec::new(),
            metrics: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// ID of the run being assembled.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.record.run_id()
    }

    /// Record a hyperparameter. Re-logging a key replaces its value.
    pub fn log_param(&mut self, key: impl Into<String>, value: impl ToString) {
        let param = ParamRecord::new(key, value);
        self.params.retain(|p| p.key() != param.key());
        self.params.push(param);
    }

    /// Record a metric; repeated logs of a key get increasing steps.
    pub fn log_metric(&mut self, key: impl Into<String>, value: f64) {
        let key = key.into();
        let step = self.metrics.iter().filter(|m| m.key() == key).count() as u64;
        self.metrics.push(MetricRecord::new(key, value, step));
    }

    /// Attach artifact bytes under `key`, stored as `file_name`.
    pub fn log_artifact(&mut self, key: impl Into<String>, file_name: &str, bytes: Vec<u8>) {
        let record = ArtifactRecord::for_bytes(key, file_name, &bytes);
        self.artifacts.retain(|a| a.record.key() != record.key());
        self.artifacts.push(PendingArtifact { record, bytes });
    }

    /// Artifacts waiting to be written.
    #[must_use]
    pub fn artifacts(&self) -> &[PendingArtifact] {
        &self.artifacts
    }

    /// Seal the run as finished and split off the artifact bytes.
    #[must_use]
    pub fn finish(mut self) -> (LoggedRun, Vec<PendingArtifact>) {
        self.record.complete(RunStatus::Finished);
        let logged = LoggedRun {
            run: self.record,
            params: self.params,
            metrics: self.metrics,
            artifacts: self.artifacts.iter().map(|a| a.record.clone()).collect(),
        };
        (logged, self.artifacts)
    }
}

/// A committed run as persisted in `run.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedRun {
    run: RunRecord,
    params: Vec<ParamRecord>,
    metrics: Vec<MetricRecord>,
    artifacts: Vec<ArtifactRecord>,
}

impl LoggedRun {
    /// Run lifecycle record.
    #[must_use]
    pub const fn record(&self) -> &RunRecord {
        &self.run
    }

    /// Mutable run lifecycle record.
    pub fn record_mut(&mut self) -> &mut RunRecord {
        &mut self.run
    }

    /// Run ID.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run.run_id()
    }

    /// All params.
    #[must_use]
    pub fn params(&self) -> &[ParamRecord] {
        &self.params
    }

    /// All metrics.
    #[must_use]
    pub fn metrics(&self) -> &[MetricRecord] {
        &self.metrics
    }

    /// All artifacts.
    #[must_use]
    pub fn artifacts(&self) -> &[ArtifactRecord] {
        &self.artifacts
    }

    /// Value of param `key`.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|p| p.key() == key).map(ParamRecord::value)
    }

    /// Latest value of metric `key` (highest step).
    #[must_use]
    pub fn metric(&self, key: &str) -> Option<f64> {
        self.metrics
            .iter()
            .filter(|m| m.key() == key)
            .max_by_key(|m| m.step())
            .map(MetricRecord::value)
    }

    /// Artifact record for `key`.
    #[must_use]
    pub fn artifact(&self, key: &str) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_run_finish() {
        let mut run = PendingRun::start("exp");
        run.log_param("n_estimators", 100);
        run.log_param("n_estimators", 50);
        run.log_metric("rmse", 3.0);
        run.log_metric("rmse", 2.0);
        run.log_artifact("model", "model.json", b"{}".to_vec());

        let (logged, artifacts) = run.finish();
        assert!(logged.record().is_finished());
        assert_eq!(logged.param("n_estimators"), Some("50"));
        assert_eq!(logged.params().len(), 1);
        assert_eq!(logged.metric("rmse"), Some(2.0));
        assert_eq!(logged.metrics().len(), 2);
        assert_eq!(artifacts.len(), 1);
        assert!(logged.artifact("model").unwrap().matches(&artifacts[0].bytes));
    }
}
