//! Result rows and summary statistics written after a batch.

use crate::models::{Categorization, FeatureRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use storage::{ArtifactStore, StorageError};
use tracing::info;

pub const PREDICTION_RESULTS: &str = "prediction_results.json";
pub const STANDARD_FILES: &str = "standard_files.json";
pub const PREDICTION_STATS: &str = "prediction_stats.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub file_path: String,
    pub filename: String,
    pub prediction: u8,
    pub probability: f64,
    /// Accepted by the predictor's confidence threshold.
    pub is_standard: bool,
    pub features: FeatureRecord,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_files: usize,
    pub standard_files: usize,
    pub non_standard_files: usize,
    pub standard_ratio: f64,
    pub confidence_stats: ConfidenceStats,
}

impl PredictionStats {
    /// All zeros for an empty batch.
    pub fn from_results(results: &[PredictionResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let total = results.len();
        let standard = results.iter().filter(|r| r.is_standard).count();
        let probabilities = results.iter().map(|r| r.probability);
        let min = probabilities.clone().fold(f64::INFINITY, f64::min);
        let max = probabilities.clone().fold(f64::NEG_INFINITY, f64::max);
        let avg = probabilities.sum::<f64>() / total as f64;
        Self {
            total_files: total,
            standard_files: standard,
            non_standard_files: total - standard,
            standard_ratio: standard as f64 / total as f64,
            confidence_stats: ConfidenceStats { min, max, avg },
        }
    }
}

/// Writes the three prediction reports into `dir`.
pub fn write_prediction_reports(
    dir: &Path,
    results: &[PredictionResult],
) -> Result<PredictionStats, StorageError> {
    let store = ArtifactStore::new(dir);
    let stats = PredictionStats::from_results(results);
    let accepted: Vec<&PredictionResult> = results.iter().filter(|r| r.is_standard).collect();
    store.put_json(PREDICTION_RESULTS, results)?;
    store.put_json(STANDARD_FILES, &accepted)?;
    store.put_json(PREDICTION_STATS, &stats)?;
    info!(
        "{} of {} files predicted standard ({:.1}%)",
        stats.standard_files,
        stats.total_files,
        stats.standard_ratio * 100.0
    );
    Ok(stats)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedFile {
    pub file_path: PathBuf,
    pub filename: String,
    /// `None` when no stage produced a category.
    pub decision: Option<Categorization>,
    /// Text extraction failure; the decision then rests on the filename.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizeSummary {
    pub total: usize,
    pub per_category: BTreeMap<String, usize>,
    pub unclassified: usize,
    pub extraction_failures: usize,
    pub copy_failures: usize,
}

impl CategorizeSummary {
    pub fn from_files(files: &[CategorizedFile]) -> Self {
        let mut summary = Self {
            total: files.len(),
            ..Self::default()
        };
        for file in files {
            match &file.decision {
                Some(d) => *summary.per_category.entry(d.category.clone()).or_default() += 1,
                None => summary.unclassified += 1,
            }
            if file.error.is_some() {
                summary.extraction_failures += 1;
            }
        }
        summary
    }
}
