use crate::errors::ExtractionError;
use crate::models::{
    ContentFeatures, ContentStats, FeatureRecord, FilenameFeatures, Section,
};
use crate::rules::KeywordRuleTable;
use crate::scoring;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Capability that turns the first `max_pages` pages of a PDF into text.
pub trait TextSource: Send + Sync {
    fn extract_text(&self, path: &Path, max_pages: usize) -> Result<String, ExtractionError>;
}

/// Reads PDFs through lopdf, one page at a time.
#[derive(Debug, Clone, Default)]
pub struct PdfTextSource;

#[cfg(feature = "pdf")]
impl TextSource for PdfTextSource {
    fn extract_text(&self, path: &Path, max_pages: usize) -> Result<String, ExtractionError> {
        let doc = lopdf::Document::load(path).map_err(|e| ExtractionError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(ExtractionError::Encrypted(path.to_path_buf()));
        }
        let mut text = String::new();
        for page in doc.get_pages().keys().take(max_pages) {
            match doc.extract_text(&[*page]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => debug!("no text on page {} of {:?}: {}", page, path, e),
            }
            text.push('\n');
        }
        Ok(text)
    }
}

#[cfg(not(feature = "pdf"))]
impl TextSource for PdfTextSource {
    fn extract_text(&self, _path: &Path, _max_pages: usize) -> Result<String, ExtractionError> {
        Err(ExtractionError::Unsupported)
    }
}

/// Serves pre-extracted text keyed by path; paths it does not know fail
/// like an unreadable file.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextSource {
    pages: HashMap<PathBuf, Vec<String>>,
}

impl MemoryTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, path: impl Into<PathBuf>, pages: Vec<String>) -> Self {
        self.pages.insert(path.into(), pages);
        self
    }

    pub fn with_text(self, path: impl Into<PathBuf>, text: &str) -> Self {
        self.with_pages(path, vec![text.to_string()])
    }
}

impl TextSource for MemoryTextSource {
    fn extract_text(&self, path: &Path, max_pages: usize) -> Result<String, ExtractionError> {
        let pages = self.pages.get(path).ok_or_else(|| ExtractionError::Unreadable {
            path: path.to_path_buf(),
            reason: "no such document".to_string(),
        })?;
        let mut text = String::new();
        for page in pages.iter().take(max_pages) {
            text.push_str(page);
            text.push('\n');
        }
        Ok(text)
    }
}

/// Turns filenames and extracted text into [`FeatureRecord`]s.
#[derive(Clone)]
pub struct TextFeatureExtractor {
    rules: Arc<KeywordRuleTable>,
    source: Arc<dyn TextSource>,
    max_pages: usize,
    min_text_length: usize,
    min_confidence: f64,
}

impl TextFeatureExtractor {
    pub fn new(rules: Arc<KeywordRuleTable>, source: Arc<dyn TextSource>) -> Self {
        Self {
            rules,
            source,
            max_pages: 5,
            min_text_length: 100,
            min_confidence: 0.6,
        }
    }

    pub fn with_limits(mut self, max_pages: usize, min_text_length: usize) -> Self {
        self.max_pages = max_pages;
        self.min_text_length = min_text_length;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn rules(&self) -> &KeywordRuleTable {
        &self.rules
    }

    pub fn source(&self) -> Arc<dyn TextSource> {
        Arc::clone(&self.source)
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    pub fn extract_filename_features(&self, filename: &str) -> FilenameFeatures {
        let rules = &self.rules;
        let standard_type = rules
            .standard_types
            .iter()
            .find(|t| t.patterns.iter().any(|p| filename.contains(p.as_str())))
            .map(|t| t.kind);
        let standard_code = rules
            .standard_code_patterns
            .iter()
            .find_map(|re| re.captures(filename))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        let year = rules
            .year_pattern
            .find(filename)
            .map(|m| m.as_str().to_string());

        FilenameFeatures {
            filename: filename.to_string(),
            standard_type,
            standard_code,
            year,
            ev_related: contains_any(filename, &rules.ev_keywords),
            standard_related: contains_any(filename, &rules.standard_keywords),
        }
    }

    /// Keyword statistics over `text`, or only its length when it is shorter
    /// than the configured minimum.
    pub fn extract_content_features(&self, text: &str) -> ContentFeatures {
        let text_length = text.chars().count();
        if text_length < self.min_text_length {
            return ContentFeatures::Sparse { text_length };
        }
        let rules = &self.rules;
        let mut stats = ContentStats {
            text_length,
            standard_keywords_count: count_occurrences(text, &rules.standard_keywords),
            ev_keywords_count: count_occurrences(text, &rules.ev_keywords),
            exclude_keywords_count: count_occurrences(text, &rules.exclude_keywords),
            ..ContentStats::default()
        };
        for (line, content) in split_lines(text).enumerate() {
            if contains_any(content, &rules.standard_keywords) {
                stats.standard_sections.push(Section {
                    line,
                    content: content.trim().to_string(),
                });
            }
            if contains_any(content, &rules.ev_keywords) {
                stats.ev_sections.push(Section {
                    line,
                    content: content.trim().to_string(),
                });
            }
        }
        ContentFeatures::Analyzed(stats)
    }

    /// Builds the complete record for text that has already been extracted
    /// (or failed to be).
    pub fn features_from_text(
        &self,
        path: &Path,
        text: Result<String, ExtractionError>,
    ) -> FeatureRecord {
        let filename = file_name(path);
        let filename_features = self.extract_filename_features(&filename);
        let content_features = match text {
            Ok(text) => self.extract_content_features(&text),
            Err(e) => {
                warn!("failed to extract text from {:?}: {}", path, e);
                ContentFeatures::Failed {
                    error: e.to_string(),
                }
            }
        };
        let (is_standard, confidence) = scoring::standard_confidence(
            &filename_features,
            &content_features,
            self.min_confidence,
        );
        debug!(
            "{}: standard={} confidence={:.3}",
            filename, is_standard, confidence
        );
        FeatureRecord {
            file_path: path.to_string_lossy().into_owned(),
            filename_features,
            content_features,
            is_standard,
            confidence,
        }
    }

    pub fn extract_file_features(&self, path: &Path) -> FeatureRecord {
        let text = self.source.extract_text(path, self.max_pages);
        self.features_from_text(path, text)
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}

fn count_occurrences(haystack: &str, keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| haystack.matches(k.as_str()).count())
        .sum()
}

/// Splits on `\r\n`, `\r` and `\n`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\r', '\n']) {
            Some(idx) => {
                let skip = if current[idx..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[idx + skip..]);
                Some(&current[..idx])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
