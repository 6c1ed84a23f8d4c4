//! Storage layer: named JSON artifacts in a directory.
//!
//! Every artifact is a pretty-printed JSON document addressed by name.
//! Writes return the blake3 digest of the bytes on disk so callers can bind
//! several artifacts into one matched set.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact not found: {0}")]
    Missing(PathBuf),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A JSON artifact read back from disk together with its digest.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub value: T,
    pub digest: String,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_of(name).is_file()
    }

    /// Serialises `value` under `name`, creating the directory if needed.
    pub fn put_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<String, StorageError> {
        let path = self.path_of(name);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, &bytes).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("wrote artifact {:?} ({} bytes)", path, bytes.len());
        Ok(digest(&bytes))
    }

    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Result<Loaded<T>, StorageError> {
        let bytes = self.get_bytes(name)?;
        let value = serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
            path: self.path_of(name),
            source,
        })?;
        Ok(Loaded {
            value,
            digest: digest(&bytes),
        })
    }

    pub fn get_bytes(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_of(name);
        if !path.is_file() {
            return Err(StorageError::Missing(path));
        }
        fs::read(&path).map_err(|source| StorageError::Io { path, source })
    }
}

pub fn digest(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Combines several digests, in order, into one fingerprint.
pub fn fingerprint<'a>(digests: impl IntoIterator<Item = &'a str>) -> String {
    let mut hasher = blake3::Hasher::new();
    for d in digests {
        hasher.update(d.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        name: String,
        weights: Vec<f64>,
    }

    #[test]
    fn put_then_get_returns_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));
        let blob = Blob {
            name: "a".into(),
            weights: vec![0.5, 1.5],
        };
        let written = store.put_json("blob.json", &blob).unwrap();
        let loaded: Loaded<Blob> = store.get_json("blob.json").unwrap();
        assert_eq!(loaded.value, blob);
        assert_eq!(loaded.digest, written);
    }

    #[test]
    fn missing_artifact_is_reported_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        match store.get_json::<Blob>("absent.json") {
            Err(StorageError::Missing(p)) => assert!(p.ends_with("absent.json")),
            other => panic!("unexpected: {:?}", other.map(|l| l.digest)),
        }
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.get_json::<Blob>("bad.json"),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn fingerprint_depends_on_order() {
        let a = fingerprint(["x", "y"]);
        let b = fingerprint(["y", "x"]);
        assert_ne!(a, b);
        assert_eq!(a, fingerprint(["x", "y"]));
    }
}
