use std::path::PathBuf;
use storage::StorageError;
use thiserror::Error;

/// Per-file failure to obtain text from a PDF. Never aborts a batch.
#[derive(Debug, Clone, Error)]
pub enum ExtractionError {
    #[error("cannot read {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("{0:?} is encrypted")]
    Encrypted(PathBuf),
    #[error("extraction of {path:?} timed out after {secs}s")]
    Timeout { path: PathBuf, secs: u64 },
    #[error("pdf support not compiled in (enable the `pdf` feature)")]
    Unsupported,
}

/// Artifacts or rule tables that cannot be used safely.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("model artifact missing: {0:?}")]
    MissingArtifact(PathBuf),
    #[error("model artifact {name} is malformed: {reason}")]
    MalformedArtifact { name: String, reason: String },
    #[error("model artifacts do not form a matched set (fingerprint {expected} != {found})")]
    MismatchedArtifacts { expected: String, found: String },
    #[error("feature schema mismatch: model expects {expected:?}, builder produces {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("cannot load rules from {path:?}: {reason}")]
    Rules { path: PathBuf, reason: String },
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for ConfigurationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Missing(path) => ConfigurationError::MissingArtifact(path),
            StorageError::Json { path, source } => ConfigurationError::MalformedArtifact {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                reason: source.to_string(),
            },
            other => ConfigurationError::Storage(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no valid training records (all {0} records failed extraction or input was empty)")]
    NoTrainingData(usize),
    #[error("model not loaded; call load() or train() first")]
    ModelNotLoaded,
}
