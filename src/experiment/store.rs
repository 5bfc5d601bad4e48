//! Experiment Store - in-memory index of one experiment's committed runs
//!
//! [`FileTracker`](super::FileTracker) loads its on-disk runs into this
//! store for querying; tests use it directly as a [`RunLogger`].

use std::collections::HashMap;
use std::path::PathBuf;

use super::selection::select_run;
use super::{ArtifactRef, ExperimentRecord, LoggedRun, PendingRun, RunLogger, SelectionPolicy};
use crate::{Error, Result};

/// In-memory store for experiment tracking data.
///
/// ## Design
///
/// Hash maps give O(1) lookups by ID. Artifact bytes logged through the
/// [`RunLogger`] impl are kept by CAS hash, so identical artifacts from
/// different runs share one buffer.
#[derive(Debug)]
pub struct ExperimentStore {
    active: ExperimentRecord,
    runs: HashMap<String, LoggedRun>,
    blobs: HashMap<String, Vec<u8>>,
}

impl Default for ExperimentStore {
    fn default() -> Self {
        Self::for_experiment(ExperimentRecord::new("default"))
    }
}

impl ExperimentStore {
    /// Create a new empty store logging into the `default` experiment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose [`RunLogger`] impl logs into `experiment`.
    #[must_use]
    pub fn for_experiment(experiment: ExperimentRecord) -> Self {
        Self {
            active: experiment,
            runs: HashMap::new(),
            blobs: HashMap::new(),
        }
    }

    /// Check if the store holds no runs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Get the number of runs in the store.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Add a committed run to the store.
    pub fn add_run(&mut self, run: LoggedRun) {
        self.runs.insert(run.run_id().to_string(), run);
    }

    /// Get a run by ID.
    #[must_use]
    pub fn get_run(&self, run_id: &str) -> Option<&LoggedRun> {
        self.runs.get(run_id)
    }

    /// Get all runs for an experiment.
    #[must_use]
    pub fn get_runs_for_experiment(&self, experiment_id: &str) -> Vec<&LoggedRun> {
        self.runs
            .values()
            .filter(|run| run.record().experiment_id() == experiment_id)
            .collect()
    }

    /// Pick one run by `policy`.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no finished run qualifies
    pub fn resolve(&self, policy: &SelectionPolicy) -> Result<&LoggedRun> {
        select_run(self.runs.values(), policy)
            .ok_or_else(|| Error::NotFound(format!("no finished run matches {policy}")))
    }

    /// Pick one run by `policy` and return its artifact `key`.
    ///
    /// The returned path is relative to the run directory.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no run qualifies or the chosen run has
    /// no artifact named `key`
    pub fn resolve_artifact(&self, policy: &SelectionPolicy, key: &str) -> Result<ArtifactRef> {
        let run = self.resolve(policy)?;
        let artifact = run.artifact(key).ok_or_else(|| {
            Error::NotFound(format!("run {} has no artifact '{key}'", run.run_id()))
        })?;

        Ok(ArtifactRef {
            run_id: run.run_id().to_string(),
            key: key.to_string(),
            path: PathBuf::from(artifact.relative_path()),
            cas_hash: artifact.cas_hash().to_string(),
        })
    }

    /// Bytes of an artifact logged through this store, if held in memory.
    #[must_use]
    pub fn artifact_bytes(&self, artifact: &ArtifactRef) -> Option<&[u8]> {
        self.blobs.get(&artifact.cas_hash).map(Vec::as_slice)
    }
}

impl RunLogger for ExperimentStore {
    fn experiment_id(&self) -> &str {
        self.active.experiment_id()
    }

    fn log_run(&mut self, run: PendingRun) -> Result<LoggedRun> {
        let (logged, artifacts) = run.finish();
        for artifact in artifacts {
            self.blobs
                .insert(artifact.record.cas_hash().to_string(), artifact.bytes);
        }
        self.add_run(logged.clone());
        Ok(logged)
    }
}
