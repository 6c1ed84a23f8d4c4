use serde::{Deserialize, Serialize};
use std::fmt;

/// Issuing body of a standard, as recognised from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardType {
    #[serde(rename = "GB")]
    Gb,
    #[serde(rename = "DB")]
    Db,
    #[serde(rename = "NB")]
    Nb,
    #[serde(rename = "T")]
    T,
    #[serde(rename = "QGDW")]
    Qgdw,
}

impl StandardType {
    /// Canonical order. The one-hot block of the feature vector and its
    /// feature names are both generated from this slice.
    pub const ALL: [StandardType; 5] = [
        StandardType::Gb,
        StandardType::Db,
        StandardType::Nb,
        StandardType::T,
        StandardType::Qgdw,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            StandardType::Gb => "GB",
            StandardType::Db => "DB",
            StandardType::Nb => "NB",
            StandardType::T => "T",
            StandardType::Qgdw => "QGDW",
        }
    }
}

impl fmt::Display for StandardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilenameFeatures {
    pub filename: String,
    pub standard_type: Option<StandardType>,
    pub standard_code: Option<String>,
    pub year: Option<String>,
    pub ev_related: bool,
    pub standard_related: bool,
}

/// A line of extracted text that contains at least one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub line: usize,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentStats {
    pub text_length: usize,
    pub standard_keywords_count: usize,
    pub ev_keywords_count: usize,
    pub exclude_keywords_count: usize,
    pub standard_sections: Vec<Section>,
    pub ev_sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContentFeatures {
    Analyzed(ContentStats),
    /// Too little text to analyse; only the length is known.
    Sparse { text_length: usize },
    Failed { error: String },
}

impl ContentFeatures {
    pub fn is_failed(&self) -> bool {
        matches!(self, ContentFeatures::Failed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ContentFeatures::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn stats(&self) -> Option<&ContentStats> {
        match self {
            ContentFeatures::Analyzed(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn text_length(&self) -> usize {
        match self {
            ContentFeatures::Analyzed(stats) => stats.text_length,
            ContentFeatures::Sparse { text_length } => *text_length,
            ContentFeatures::Failed { .. } => 0,
        }
    }

    pub fn standard_keywords_count(&self) -> usize {
        self.stats().map(|s| s.standard_keywords_count).unwrap_or(0)
    }

    pub fn ev_keywords_count(&self) -> usize {
        self.stats().map(|s| s.ev_keywords_count).unwrap_or(0)
    }

    pub fn exclude_keywords_count(&self) -> usize {
        self.stats().map(|s| s.exclude_keywords_count).unwrap_or(0)
    }

    pub fn standard_sections(&self) -> &[Section] {
        self.stats()
            .map(|s| s.standard_sections.as_slice())
            .unwrap_or(&[])
    }

    pub fn ev_sections(&self) -> &[Section] {
        self.stats().map(|s| s.ev_sections.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub file_path: String,
    pub filename_features: FilenameFeatures,
    pub content_features: ContentFeatures,
    pub is_standard: bool,
    pub confidence: f64,
}

/// Multi-category decision produced by the rule path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Categorization {
    pub category: String,
    pub confidence: f64,
    pub stage: DecisionStage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStage {
    ExactMatch,
    SpecialRule,
    FilenameKeyword,
    KeywordScore,
    TechnicalFallback,
}
