use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanPaths,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub rules: RuleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPaths {
    /// Directory holding known standard documents, used for feature extraction.
    #[serde(default = "default_standards_dir")]
    pub standards: String,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for ScanPaths {
    fn default() -> Self {
        Self {
            standards: default_standards_dir(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Pages read for the binary standard-document path.
    pub max_pages: usize,
    /// Pages read for multi-category classification.
    pub category_max_pages: usize,
    pub min_text_length: usize,
    pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            category_max_pages: 3,
            min_text_length: 100,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub min_confidence: f64,
    /// Below this best stage-4 confidence the technical fallback is tried.
    pub fallback_threshold: f64,
    pub fallback_min_hits: usize,
    pub fallback_confidence: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            fallback_threshold: 0.2,
            fallback_min_hits: 2,
            fallback_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: String,
    pub n_trees: usize,
    pub max_depth: usize,
    pub test_size: f64,
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: "./model".to_string(),
            n_trees: 100,
            max_depth: 10,
            test_size: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub standard_dir: String,
    pub category_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            standard_dir: "./standards_out".to_string(),
            category_dir: "./categorized".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// TOML rule file replacing the built-in keyword tables.
    pub path: Option<String>,
}

fn default_standards_dir() -> String {
    "./pdfs/standards".to_string()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(config::Environment::with_prefix("PDFSORT").separator("__"));
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.extraction.max_pages, 5);
        assert_eq!(cfg.extraction.category_max_pages, 3);
        assert_eq!(cfg.extraction.min_text_length, 100);
        assert_eq!(cfg.scoring.min_confidence, 0.6);
        assert_eq!(cfg.scoring.fallback_threshold, 0.2);
        assert_eq!(cfg.model.seed, 42);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[scoring]\nmin_confidence = 0.75\n").unwrap();
        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.scoring.min_confidence, 0.75);
        assert_eq!(cfg.scoring.fallback_min_hits, 2);
        assert_eq!(cfg.extraction.timeout_secs, 60);
    }
}
