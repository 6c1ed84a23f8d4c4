//! Trained "is this a standard document" classifier and its artifact set.

use crate::config::ModelConfig;
use crate::errors::{ConfigurationError, ValidationError};
use crate::forest::{stratified_split, ForestParams, RandomForest};
use crate::models::FeatureRecord;
use crate::scaler::StandardScaler;
use crate::vectorizer::{build_feature_vector, feature_names};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use storage::{fingerprint, ArtifactStore, StorageError};
use tracing::{debug, info};

pub const CLASSIFIER_ARTIFACT: &str = "standard_classifier.json";
pub const SCALER_ARTIFACT: &str = "scaler.json";
pub const FEATURE_NAMES_ARTIFACT: &str = "feature_names.json";
pub const MODEL_INFO_ARTIFACT: &str = "model_info.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// `None` when the test split came out empty.
    pub accuracy: Option<f64>,
    pub feature_importance: BTreeMap<String, f64>,
    pub n_samples: usize,
    pub n_features: usize,
    pub n_standard: usize,
    pub n_non_standard: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub test_size: f64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
    pub trained_at: String,
    /// Binds the classifier, scaler and feature-name blobs into one set.
    #[serde(default)]
    pub artifact_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StandardClassifierModel {
    pub forest: RandomForest,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub info: ModelInfo,
}

impl StandardClassifierModel {
    /// Fits scaler and forest on every record whose extraction succeeded.
    pub fn train(records: &[FeatureRecord], cfg: &ModelConfig) -> Result<Self, ValidationError> {
        let valid: Vec<&FeatureRecord> = records
            .iter()
            .filter(|r| !r.content_features.is_failed())
            .collect();
        if valid.is_empty() {
            return Err(ValidationError::NoTrainingData(records.len()));
        }

        let x: Vec<Vec<f64>> = valid.iter().map(|r| build_feature_vector(r)).collect();
        let y: Vec<u8> = valid.iter().map(|r| u8::from(r.is_standard)).collect();
        let n_standard = y.iter().filter(|l| **l == 1).count();
        info!(
            "training on {} records ({} standard, {} non-standard, {} skipped)",
            valid.len(),
            n_standard,
            valid.len() - n_standard,
            records.len() - valid.len()
        );

        let scaler = StandardScaler::fit(&x);
        let scaled = scaler.transform_all(&x);
        let (train_idx, test_idx) = stratified_split(&y, cfg.test_size, cfg.seed);
        let train_x: Vec<Vec<f64>> = train_idx.iter().map(|i| scaled[*i].clone()).collect();
        let train_y: Vec<u8> = train_idx.iter().map(|i| y[*i]).collect();

        let forest = RandomForest::fit(
            &train_x,
            &train_y,
            ForestParams {
                n_trees: cfg.n_trees,
                max_depth: cfg.max_depth,
                seed: cfg.seed,
            },
        );

        let accuracy = (!test_idx.is_empty()).then(|| {
            let correct = test_idx
                .iter()
                .filter(|i| forest.predict(&scaled[**i]).0 == y[**i])
                .count();
            correct as f64 / test_idx.len() as f64
        });
        match accuracy {
            Some(a) => info!("held-out accuracy {:.4} on {} records", a, test_idx.len()),
            None => info!("test split empty; accuracy not measured"),
        }

        let names = feature_names();
        let feature_importance = names
            .iter()
            .cloned()
            .zip(forest.feature_importances().iter().copied())
            .collect();

        let info = ModelInfo {
            accuracy,
            feature_importance,
            n_samples: valid.len(),
            n_features: names.len(),
            n_standard,
            n_non_standard: valid.len() - n_standard,
            n_train: train_idx.len(),
            n_test: test_idx.len(),
            test_size: cfg.test_size,
            n_trees: cfg.n_trees,
            max_depth: cfg.max_depth,
            seed: cfg.seed,
            trained_at: chrono::Utc::now().to_rfc3339(),
            artifact_fingerprint: String::new(),
        };

        Ok(Self {
            forest,
            scaler,
            feature_names: names,
            info,
        })
    }

    /// `(label, positive-class probability)`; failed records are `(0, 0.0)`.
    pub fn predict(&self, record: &FeatureRecord) -> (u8, f64) {
        if record.content_features.is_failed() {
            return (0, 0.0);
        }
        let row = self.scaler.transform(&build_feature_vector(record));
        self.forest.predict(&row)
    }

    /// Writes the four artifacts; `model_info.json` goes last and carries
    /// the fingerprint of the other three.
    pub fn save(&mut self, dir: &Path) -> Result<(), StorageError> {
        let store = ArtifactStore::new(dir);
        let forest_digest = store.put_json(CLASSIFIER_ARTIFACT, &self.forest)?;
        let scaler_digest = store.put_json(SCALER_ARTIFACT, &self.scaler)?;
        let names_digest = store.put_json(FEATURE_NAMES_ARTIFACT, &self.feature_names)?;
        self.info.artifact_fingerprint = fingerprint([
            forest_digest.as_str(),
            scaler_digest.as_str(),
            names_digest.as_str(),
        ]);
        store.put_json(MODEL_INFO_ARTIFACT, &self.info)?;
        info!("saved model artifacts to {:?}", dir);
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self, ConfigurationError> {
        let store = ArtifactStore::new(dir);
        let info = store.get_json::<ModelInfo>(MODEL_INFO_ARTIFACT)?.value;
        let forest = store.get_json::<RandomForest>(CLASSIFIER_ARTIFACT)?;
        let scaler = store.get_json::<StandardScaler>(SCALER_ARTIFACT)?;
        let names = store.get_json::<Vec<String>>(FEATURE_NAMES_ARTIFACT)?;

        let found = fingerprint([
            forest.digest.as_str(),
            scaler.digest.as_str(),
            names.digest.as_str(),
        ]);
        if found != info.artifact_fingerprint {
            return Err(ConfigurationError::MismatchedArtifacts {
                expected: info.artifact_fingerprint,
                found,
            });
        }

        let expected_names = feature_names();
        if names.value != expected_names {
            return Err(ConfigurationError::SchemaMismatch {
                expected: names.value,
                found: expected_names,
            });
        }
        let width = expected_names.len();
        if forest.value.n_features != width {
            return Err(dimension_error(CLASSIFIER_ARTIFACT, forest.value.n_features, width));
        }
        if scaler.value.width() != width {
            return Err(dimension_error(SCALER_ARTIFACT, scaler.value.width(), width));
        }

        debug!("loaded model trained at {}", info.trained_at);
        Ok(Self {
            forest: forest.value,
            scaler: scaler.value,
            feature_names: names.value,
            info,
        })
    }
}

fn dimension_error(name: &str, found: usize, expected: usize) -> ConfigurationError {
    ConfigurationError::MalformedArtifact {
        name: name.to_string(),
        reason: format!("{found} features, expected {expected}"),
    }
}

/// Applies a loaded model with an acceptance threshold.
#[derive(Debug, Clone)]
pub struct StandardPredictor {
    model: Option<Arc<StandardClassifierModel>>,
    min_confidence: f64,
}

impl StandardPredictor {
    pub fn new(min_confidence: f64) -> Self {
        Self {
            model: None,
            min_confidence,
        }
    }

    pub fn with_model(mut self, model: StandardClassifierModel) -> Self {
        self.model = Some(Arc::new(model));
        self
    }

    pub fn load(&mut self, dir: &Path) -> Result<(), ConfigurationError> {
        self.model = Some(Arc::new(StandardClassifierModel::load(dir)?));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<(u8, f64), ValidationError> {
        let model = self.model.as_ref().ok_or(ValidationError::ModelNotLoaded)?;
        Ok(model.predict(record))
    }

    pub fn accepts(&self, label: u8, probability: f64) -> bool {
        label == 1 && probability >= self.min_confidence
    }
}
