//! Batch orchestration: feature extraction, training, prediction and
//! categorisation over directory trees.

use crate::classifier::DocumentClassifier;
use crate::config::AppConfig;
use crate::errors::{ConfigurationError, ExtractionError};
use crate::extractor::{file_name, TextFeatureExtractor, TextSource};
use crate::models::FeatureRecord;
use crate::report::{CategorizedFile, PredictionResult};
use crate::rules::KeywordRuleTable;
use crate::scanner;
use crate::trainer::{StandardClassifierModel, StandardPredictor};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storage::ArtifactStore;
use tokio::task;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const FEATURES_ARTIFACT: &str = "standard_features.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, ok: bool) {
        self.total += 1;
        if ok {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }
}

pub struct Pipeline {
    config: AppConfig,
    rules: Arc<KeywordRuleTable>,
    source: Arc<dyn TextSource>,
}

impl Pipeline {
    /// Builds the rule table named by the config (or the built-in one).
    pub fn new(config: AppConfig, source: Arc<dyn TextSource>) -> Result<Self, ConfigurationError> {
        let rules = Arc::new(KeywordRuleTable::from_config(&config.rules)?);
        Ok(Self::with_rules(config, rules, source))
    }

    pub fn with_rules(
        config: AppConfig,
        rules: Arc<KeywordRuleTable>,
        source: Arc<dyn TextSource>,
    ) -> Self {
        Self {
            config,
            rules,
            source,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn rules(&self) -> &KeywordRuleTable {
        &self.rules
    }

    fn extractor(&self) -> TextFeatureExtractor {
        let ex = &self.config.extraction;
        TextFeatureExtractor::new(Arc::clone(&self.rules), Arc::clone(&self.source))
            .with_limits(ex.max_pages, ex.min_text_length)
            .with_min_confidence(self.config.scoring.min_confidence)
    }

    /// Extracts text on a blocking thread, giving up after the configured
    /// timeout. A timed-out extraction keeps running detached.
    pub async fn read_text(&self, path: &Path, max_pages: usize) -> Result<String, ExtractionError> {
        let source = Arc::clone(&self.source);
        let owned = path.to_path_buf();
        let secs = self.config.extraction.timeout_secs;
        let job = task::spawn_blocking(move || source.extract_text(&owned, max_pages));
        match timeout(Duration::from_secs(secs), job).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ExtractionError::Unreadable {
                path: path.to_path_buf(),
                reason: join.to_string(),
            }),
            Err(_) => Err(ExtractionError::Timeout {
                path: path.to_path_buf(),
                secs,
            }),
        }
    }

    pub async fn discover(&self, roots: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
        let found = scanner::scan(roots, &self.config.scan.exclude).await?;
        info!("found {} pdf files under {:?}", found.len(), roots);
        Ok(found)
    }

    /// One [`FeatureRecord`] per PDF, in path order. Extraction failures
    /// are kept as failed records.
    pub async fn extract_features(
        &self,
        roots: &[PathBuf],
    ) -> anyhow::Result<(Vec<FeatureRecord>, BatchSummary)> {
        let paths = self.discover(roots).await?;
        Ok(self.extract_paths(&paths).await)
    }

    pub async fn extract_paths(&self, paths: &[PathBuf]) -> (Vec<FeatureRecord>, BatchSummary) {
        let extractor = self.extractor();
        let mut summary = BatchSummary::default();
        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let text = self.read_text(path, extractor.max_pages()).await;
            let record = extractor.features_from_text(path, text);
            summary.record(!record.content_features.is_failed());
            debug!(
                "{}: standard={} confidence={:.3}",
                record.filename_features.filename, record.is_standard, record.confidence
            );
            records.push(record);
        }
        info!(
            "feature extraction: {} total, {} ok, {} failed",
            summary.total, summary.succeeded, summary.failed
        );
        (records, summary)
    }

    /// Trains on `records` and writes the artifact set to the model dir.
    pub fn train(&self, records: &[FeatureRecord]) -> anyhow::Result<StandardClassifierModel> {
        let mut model = StandardClassifierModel::train(records, &self.config.model)?;
        let dir = Path::new(&self.config.model.dir);
        model
            .save(dir)
            .with_context(|| format!("failed to save model to {:?}", dir))?;
        Ok(model)
    }

    /// Loads the model dir into a predictor using the configured threshold.
    pub fn load_predictor(&self) -> anyhow::Result<StandardPredictor> {
        let mut predictor = StandardPredictor::new(self.config.scoring.min_confidence);
        let dir = Path::new(&self.config.model.dir);
        predictor
            .load(dir)
            .with_context(|| format!("cannot load model from {:?}", dir))?;
        Ok(predictor)
    }

    pub async fn predict(
        &self,
        predictor: &StandardPredictor,
        roots: &[PathBuf],
    ) -> anyhow::Result<(Vec<PredictionResult>, BatchSummary)> {
        let paths = self.discover(roots).await?;
        let extractor = self.extractor();
        let mut summary = BatchSummary::default();
        let mut results = Vec::with_capacity(paths.len());
        for path in &paths {
            let text = self.read_text(path, extractor.max_pages()).await;
            let record = extractor.features_from_text(path, text);
            let (prediction, probability) = predictor.predict(&record)?;
            let is_standard = predictor.accepts(prediction, probability);
            summary.record(!record.content_features.is_failed());
            if is_standard {
                info!(
                    "standard: {} ({:.3})",
                    record.filename_features.filename, probability
                );
            }
            results.push(PredictionResult {
                file_path: record.file_path.clone(),
                filename: record.filename_features.filename.clone(),
                prediction,
                probability,
                is_standard,
                features: record,
            });
        }
        Ok((results, summary))
    }

    /// Multi-category decision for every PDF. Files whose text cannot be
    /// read are still classified on their filename alone.
    pub async fn categorize(&self, roots: &[PathBuf]) -> anyhow::Result<Vec<CategorizedFile>> {
        let paths = self.discover(roots).await?;
        let classifier = DocumentClassifier::new(&self.rules, &self.config.scoring);
        let max_pages = self.config.extraction.category_max_pages;
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let filename = file_name(&path);
            let (text, error) = match self.read_text(&path, max_pages).await {
                Ok(text) => (text, None),
                Err(e) => {
                    warn!("failed to extract text from {:?}: {}", path, e);
                    (String::new(), Some(e.to_string()))
                }
            };
            let decision = classifier.classify(&filename, &text);
            match &decision {
                Some(d) => info!(
                    "{} -> {} ({:.2}, {:?})",
                    filename, d.category, d.confidence, d.stage
                ),
                None => debug!("{} -> unclassified", filename),
            }
            files.push(CategorizedFile {
                file_path: path,
                filename,
                decision,
                error,
            });
        }
        Ok(files)
    }
}

pub fn save_features(path: &Path, records: &[FeatureRecord]) -> anyhow::Result<()> {
    let (store, name) = store_for(path);
    store
        .put_json(&name, records)
        .with_context(|| format!("failed to write features to {:?}", path))?;
    info!("saved {} feature records to {:?}", records.len(), path);
    Ok(())
}

pub fn load_features(path: &Path) -> anyhow::Result<Vec<FeatureRecord>> {
    let (store, name) = store_for(path);
    let loaded = store
        .get_json::<Vec<FeatureRecord>>(&name)
        .with_context(|| format!("failed to read features from {:?}", path))?;
    Ok(loaded.value)
}

fn store_for(path: &Path) -> (ArtifactStore, String) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| FEATURES_ARTIFACT.to_string());
    (ArtifactStore::new(dir), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::MemoryTextSource;

    struct SlowSource;

    impl TextSource for SlowSource {
        fn extract_text(&self, _path: &Path, _max_pages: usize) -> Result<String, ExtractionError> {
            std::thread::sleep(Duration::from_secs(2));
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn slow_extraction_times_out() {
        let mut config = AppConfig::default();
        config.extraction.timeout_secs = 1;
        let pipeline = Pipeline::new(config, Arc::new(SlowSource)).unwrap();
        let err = pipeline
            .read_text(Path::new("slow.pdf"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Timeout { secs: 1, .. }));
    }

    #[tokio::test]
    async fn unreadable_files_are_counted_not_fatal() {
        let source = MemoryTextSource::new().with_text("/docs/ok.pdf", "标准");
        let pipeline = Pipeline::new(AppConfig::default(), Arc::new(source)).unwrap();
        let paths = vec![PathBuf::from("/docs/ok.pdf"), PathBuf::from("/docs/gone.pdf")];
        let (records, summary) = pipeline.extract_paths(&paths).await;
        assert_eq!(records.len(), 2);
        assert_eq!(
            summary,
            BatchSummary {
                total: 2,
                succeeded: 1,
                failed: 1
            }
        );
        assert!(records[1].content_features.is_failed());
    }

    #[test]
    fn feature_dump_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FEATURES_ARTIFACT);
        let extractor = TextFeatureExtractor::new(
            Arc::new(KeywordRuleTable::builtin()),
            Arc::new(MemoryTextSource::new()),
        );
        let records = vec![extractor.features_from_text(
            Path::new("/docs/GB 18487.1-2015.pdf"),
            Ok("标准".repeat(60)),
        )];
        save_features(&path, &records).unwrap();
        let loaded = load_features(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].filename_features, records[0].filename_features);
        assert_eq!(loaded[0].content_features, records[0].content_features);
        assert_eq!(loaded[0].is_standard, records[0].is_standard);
    }
}
