//! Model locations: plain paths or `runs:/` URIs

use std::fmt;
use std::path::PathBuf;

/// Artifact key used when a `runs:/` URI names no key
pub const DEFAULT_ARTIFACT_KEY: &str = "model";

const RUNS_SCHEME: &str = "runs:/";
const LATEST: &str = "latest";

/// Where to load a model from
///
/// - `runs:/latest[/<key>]`: most recent finished run in the tracking store
/// - `runs:/<run_id>[/<key>]`: a specific run
/// - anything else: a file or artifact directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelUri {
    /// Filesystem path
    Path(PathBuf),
    /// Specific run
    Run {
        /// Run ID
        run_id: String,
        /// Artifact key within the run
        key: String,
    },
    /// Most recent finished run
    Latest {
        /// Artifact key within the run
        key: String,
    },
}

impl ModelUri {
    /// Parse a `MODEL_PATH` value
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let Some(rest) = value.strip_prefix(RUNS_SCHEME) else {
            return Self::Path(PathBuf::from(value));
        };

        let mut parts = rest.trim_matches('/').splitn(2, '/');
        let target = parts.next().unwrap_or_default();
        let key = parts
            .next()
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_ARTIFACT_KEY)
            .to_string();

        if target.is_empty() || target == LATEST {
            Self::Latest { key }
        } else {
            Self::Run {
                run_id: target.to_string(),
                key,
            }
        }
    }

    /// URI of artifact `key` in run `run_id`
    #[must_use]
    pub fn for_run(run_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Run {
            run_id: run_id.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ModelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Run { run_id, key } => write!(f, "{RUNS_SCHEME}{run_id}/{key}"),
            Self::Latest { key } => write!(f, "{RUNS_SCHEME}{LATEST}/{key}"),
        }
    }
}
