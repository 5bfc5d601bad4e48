//! File-backed tracking store
//!
//! ## Layout
//!
//! ```text
//! <root>/<experiment_id>/experiment.json
//! <root>/<experiment_id>/runs/<run_id>/run.json
//! <root>/<experiment_id>/runs/<run_id>/artifacts/<key>/<file>
//! ```
//!
//! A run is assembled under `runs/.staging-<run_id>` and renamed into place
//! once every file is written, so readers never observe a partial run.

use std::fs;
use std::path::{Path, PathBuf};

use super::run::PendingArtifact;
use super::{
    ArtifactRef, ExperimentRecord, ExperimentStore, LoggedRun, PendingRun, RunLogger,
    SelectionPolicy,
};
use crate::{Error, Result};

const EXPERIMENT_FILE: &str = "experiment.json";
const RUN_FILE: &str = "run.json";
const RUNS_DIR: &str = "runs";
const STAGING_PREFIX: &str = ".staging-";

/// Tracking store rooted at a directory
#[derive(Debug, Clone)]
pub struct FileTracker {
    root: PathBuf,
    experiment: ExperimentRecord,
}

impl FileTracker {
    /// Open (creating if needed) experiment `name` under `root`
    ///
    /// # Errors
    /// Returns error if the directories or `experiment.json` cannot be
    /// created or read
    pub fn open(root: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let root = root.into();
        let dir = root.join(ExperimentRecord::slug(name));
        fs::create_dir_all(dir.join(RUNS_DIR))?;

        let file = dir.join(EXPERIMENT_FILE);
        let experiment = if file.exists() {
            read_json(&file)?
        } else {
            let experiment = ExperimentRecord::new(name);
            fs::write(&file, serde_json::to_vec_pretty(&experiment)?)?;
            tracing::info!(experiment = %experiment.experiment_id(), root = %root.display(), "created experiment");
            experiment
        };

        Ok(Self { root, experiment })
    }

    /// Open experiment `name` under `root` without creating anything
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if the experiment has never been written
    pub fn open_existing(root: impl Into<PathBuf>, name: &str) -> Result<Self> {
        let root = root.into();
        let file = root.join(ExperimentRecord::slug(name)).join(EXPERIMENT_FILE);
        if !file.exists() {
            return Err(Error::NotFound(format!(
                "experiment '{name}' not found under {}",
                root.display()
            )));
        }
        Ok(Self {
            experiment: read_json(&file)?,
            root,
        })
    }

    /// Tracking root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Experiment this tracker logs into
    #[must_use]
    pub const fn experiment(&self) -> &ExperimentRecord {
        &self.experiment
    }

    fn runs_dir(&self) -> PathBuf {
        self.root
            .join(self.experiment.experiment_id())
            .join(RUNS_DIR)
    }

    /// Directory of a committed run
    #[must_use]
    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    /// Read every committed run into an in-memory store
    ///
    /// Staging directories and directories without `run.json` are skipped.
    ///
    /// # Errors
    /// Returns error if the runs directory or a `run.json` cannot be read
    pub fn load_store(&self) -> Result<ExperimentStore> {
        let mut store = ExperimentStore::for_experiment(self.experiment.clone());

        for entry in fs::read_dir(self.runs_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') || !entry.file_type()?.is_dir() {
                continue;
            }
            let file = entry.path().join(RUN_FILE);
            if !file.exists() {
                tracing::warn!(dir = %entry.path().display(), "run directory without run.json, skipping");
                continue;
            }
            store.add_run(read_json(&file)?);
        }

        Ok(store)
    }

    /// Pick one committed run by `policy`
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no run qualifies
    pub fn resolve(&self, policy: &SelectionPolicy) -> Result<LoggedRun> {
        self.load_store()?.resolve(policy).cloned()
    }

    /// Pick one committed run by `policy` and locate its artifact `key`
    ///
    /// The returned path is absolute within this tracker's root.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] if no run or artifact qualifies
    pub fn resolve_artifact(&self, policy: &SelectionPolicy, key: &str) -> Result<ArtifactRef> {
        let mut artifact = self.load_store()?.resolve_artifact(policy, key)?;
        artifact.path = self.run_dir(&artifact.run_id).join(&artifact.path);
        tracing::debug!(run_id = %artifact.run_id, %policy, path = %artifact.path.display(), "resolved artifact");
        Ok(artifact)
    }

    /// Read an artifact and check its content hash
    ///
    /// # Errors
    /// Returns [`Error::Tracking`] if the bytes do not match the logged hash
    pub fn read_artifact(&self, artifact: &ArtifactRef) -> Result<Vec<u8>> {
        let bytes = fs::read(&artifact.path)?;
        if !artifact.matches(&bytes) {
            return Err(Error::Tracking(format!(
                "artifact {} of run {} does not match {}",
                artifact.key, artifact.run_id, artifact.cas_hash
            )));
        }
        Ok(bytes)
    }

    fn write_staged(staging: &Path, logged: &LoggedRun, artifacts: &[PendingArtifact]) -> Result<()> {
        for artifact in artifacts {
            let path = staging.join(artifact.record.relative_path());
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, &artifact.bytes)?;
        }
        fs::write(staging.join(RUN_FILE), serde_json::to_vec_pretty(logged)?)?;
        Ok(())
    }
}

impl RunLogger for FileTracker {
    fn experiment_id(&self) -> &str {
        self.experiment.experiment_id()
    }

    fn log_run(&mut self, run: PendingRun) -> Result<LoggedRun> {
        let (logged, artifacts) = run.finish();
        let final_dir = self.run_dir(logged.run_id());
        if final_dir.exists() {
            return Err(Error::Tracking(format!(
                "run {} already exists",
                logged.run_id()
            )));
        }

        let staging = self
            .runs_dir()
            .join(format!("{STAGING_PREFIX}{}", logged.run_id()));
        fs::create_dir_all(&staging)?;

        let committed = Self::write_staged(&staging, &logged, &artifacts)
            .and_then(|()| fs::rename(&staging, &final_dir).map_err(Error::from));
        if let Err(e) = committed {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        tracing::info!(
            run_id = %logged.run_id(),
            dir = %final_dir.display(),
            params = logged.params().len(),
            metrics = logged.metrics().len(),
            artifacts = logged.artifacts().len(),
            "run logged"
        );
        Ok(logged)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Tracking(format!("malformed {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = FileTracker::open(dir.path(), "Predictive Maintenance").unwrap();

        assert_eq!(tracker.experiment_id(), "predictive-maintenance");
        assert!(dir
            .path()
            .join("predictive-maintenance/experiment.json")
            .exists());
        assert!(dir.path().join("predictive-maintenance/runs").is_dir());

        // Reopening keeps the original record
        let again = FileTracker::open(dir.path(), "Predictive Maintenance").unwrap();
        assert_eq!(again.experiment(), tracker.experiment());
    }

    #[test]
    fn test_open_existing_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            FileTracker::open_existing(dir.path(), "nothing"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_log_run_is_committed_without_staging_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::open(dir.path(), "exp").unwrap();

        let mut run = tracker.start_run();
        run.log_param("n_estimators", 100);
        run.log_metric("rmse", 1.25);
        run.log_artifact("model", "model.json", b"{}".to_vec());
        let logged = tracker.log_run(run).unwrap();

        let run_dir = tracker.run_dir(logged.run_id());
        assert!(run_dir.join("run.json").exists());
        assert!(run_dir.join("artifacts/model/model.json").exists());

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("exp/runs"))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_resolve_artifact_and_verify_hash() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = FileTracker::open(dir.path(), "exp").unwrap();

        let mut run = tracker.start_run();
        run.log_artifact("model", "model.json", b"{\"v\":1}".to_vec());
        let logged = tracker.log_run(run).unwrap();

        let artifact = tracker
            .resolve_artifact(&SelectionPolicy::MostRecent, "model")
            .unwrap();
        assert_eq!(artifact.run_id, logged.run_id());
        assert!(artifact.path.starts_with(dir.path()));
        assert_eq!(tracker.read_artifact(&artifact).unwrap(), b"{\"v\":1}");

        fs::write(&artifact.path, b"tampered").unwrap();
        assert!(matches!(
            tracker.read_artifact(&artifact),
            Err(Error::Tracking(_))
        ));
    }

    #[test]
    fn test_load_store_skips_staging_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = FileTracker::open(dir.path(), "exp").unwrap();
        fs::create_dir_all(dir.path().join("exp/runs/.staging-abc")).unwrap();
        fs::create_dir_all(dir.path().join("exp/runs/half-written")).unwrap();

        let store = tracker.load_store().unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            tracker.resolve(&SelectionPolicy::MostRecent),
            Err(Error::NotFound(_))
        ));
    }
}
