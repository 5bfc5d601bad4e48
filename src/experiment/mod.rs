//! Experiment tracking
//!
//! Every training invocation becomes one committed run carrying its
//! hyperparameters, validation metric and model artifact.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< LoggedRun (N)
//!                              ├── RunRecord        [lifecycle]
//!                              ├──< ParamRecord  (N)
//!                              ├──< MetricRecord (N)
//!                              └──< ArtifactRecord (N) [CAS]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use maintenance_ml::experiment::{ExperimentStore, RunLogger, SelectionPolicy};
//!
//! let mut store = ExperimentStore::new();
//!
//! let mut run = store.start_run();
//! run.log_param("n_estimators", 100);
//! run.log_metric("rmse", 12.3);
//! run.log_artifact("model", "model.json", b"{}".to_vec());
//! let logged = store.log_run(run)?;
//!
//! let latest = store.resolve_artifact(&SelectionPolicy::MostRecent, "model")?;
//! assert_eq!(latest.run_id, logged.run_id());
//! # Ok::<(), maintenance_ml::Error>(())
//! ```

mod artifact_record;
mod experiment_record;
mod metric_record;
mod run;
mod run_record;
mod selection;
mod store;
mod tracker;
mod uri;

pub use artifact_record::{cas_hash, ArtifactRecord};
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder};
pub use metric_record::{MetricRecord, ParamRecord};
pub use run::{LoggedRun, PendingArtifact, PendingRun};
pub use run_record::{RunRecord, RunStatus};
pub use selection::{select_run, SelectionPolicy};
pub use store::ExperimentStore;
pub use tracker::FileTracker;
pub use uri::{ModelUri, DEFAULT_ARTIFACT_KEY};

use crate::Result;
use std::path::PathBuf;

/// Sink for committed runs.
///
/// `log_run` is all-or-nothing: either every param, metric and artifact of
/// the run is stored, or none is.
pub trait RunLogger {
    /// Experiment new runs belong to.
    fn experiment_id(&self) -> &str;

    /// Begin assembling a run in memory.
    fn start_run(&self) -> PendingRun {
        PendingRun::start(self.experiment_id())
    }

    /// Commit a run.
    ///
    /// # Errors
    /// Returns error if the run cannot be persisted; nothing is stored then
    fn log_run(&mut self, run: PendingRun) -> Result<LoggedRun>;
}

/// Resolved location of one artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    /// Owning run
    pub run_id: String,
    /// Artifact key
    pub key: String,
    /// File location (relative to the run directory when produced by an
    /// [`ExperimentStore`], absolute when produced by a [`FileTracker`])
    pub path: PathBuf,
    /// Logged `sha256:<hex>` content hash
    pub cas_hash: String,
}

impl ArtifactRef {
    /// True if `bytes` hash to the logged content hash.
    #[must_use]
    pub fn matches(&self, bytes: &[u8]) -> bool {
        cas_hash(bytes) == self.cas_hash
    }

    /// `runs:/` URI of this artifact.
    #[must_use]
    pub fn uri(&self) -> ModelUri {
        ModelUri::for_run(&self.run_id, &self.key)
    }
}
