//! Keyword and pattern tables driving both scoring paths.
//!
//! [`RuleSet`] is the plain, serialisable form (built-in or read from TOML);
//! [`KeywordRuleTable`] is the compiled, immutable form handed to the
//! extractor and classifier. Every first-match lookup walks a `Vec` in
//! declared order.

use crate::config::RuleConfig;
use crate::errors::ConfigurationError;
use crate::models::StandardType;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandardTypeSpec {
    pub kind: StandardType,
    pub name: String,
    pub patterns: Vec<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategorySpec {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub min_confidence: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpecialRuleSpec {
    pub category: String,
    pub filename_patterns: Vec<String>,
    #[serde(default)]
    pub content_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilenameKeywordSpec {
    pub category: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuleSet {
    pub year_pattern: String,
    pub technical_category: String,
    pub standard_code_patterns: Vec<String>,
    pub ev_keywords: Vec<String>,
    pub standard_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub category_exclude_keywords: Vec<String>,
    pub technical_keywords: Vec<String>,
    pub standard_types: Vec<StandardTypeSpec>,
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub special_rules: Vec<SpecialRuleSpec>,
    #[serde(default)]
    pub filename_keywords: Vec<FilenameKeywordSpec>,
    #[serde(default)]
    pub exact_matches: BTreeMap<String, String>,
}

impl RuleSet {
    pub fn builtin() -> Self {
        crate::builtin::rule_set()
    }
}

#[derive(Debug, Clone)]
pub struct StandardTypeRule {
    pub kind: StandardType,
    pub name: String,
    pub patterns: Vec<String>,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: String,
    pub keywords: Vec<String>,
    /// Case-insensitive; empty when the category has keywords only.
    pub patterns: Vec<Regex>,
    pub priority: i32,
    pub min_confidence: f64,
}

#[derive(Debug, Clone)]
pub struct SpecialRule {
    pub category: String,
    pub filename_patterns: Vec<Regex>,
    pub content_keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FilenameKeywordRule {
    pub category: String,
    /// Stored lowercase.
    pub keywords: Vec<String>,
}

/// Filename to category overrides. Highest precedence in categorisation.
#[derive(Debug, Clone, Default)]
pub struct ExactMatchTable {
    entries: BTreeMap<String, String>,
}

impl ExactMatchTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone)]
pub struct KeywordRuleTable {
    /// Sorted by descending priority; declaration order breaks ties.
    pub standard_types: Vec<StandardTypeRule>,
    pub standard_code_patterns: Vec<Regex>,
    pub year_pattern: Regex,
    pub ev_keywords: Vec<String>,
    pub standard_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub categories: Vec<CategoryRule>,
    pub category_exclude_keywords: Vec<String>,
    pub special_rules: Vec<SpecialRule>,
    pub filename_keywords: Vec<FilenameKeywordRule>,
    pub exact_matches: ExactMatchTable,
    pub technical_category: String,
    pub technical_keywords: Vec<String>,
}

impl KeywordRuleTable {
    pub fn builtin() -> Self {
        // The built-in patterns are fixed literals covered by tests.
        Self::from_set(RuleSet::builtin()).expect("built-in rule set compiles")
    }

    pub fn from_set(set: RuleSet) -> Result<Self, ConfigurationError> {
        let mut standard_types: Vec<StandardTypeRule> = set
            .standard_types
            .into_iter()
            .map(|s| StandardTypeRule {
                kind: s.kind,
                name: s.name,
                patterns: s.patterns,
                priority: s.priority,
            })
            .collect();
        standard_types.sort_by(|a, b| b.priority.cmp(&a.priority));

        let categories = set
            .categories
            .into_iter()
            .map(|c| {
                Ok(CategoryRule {
                    patterns: compile_all(&c.patterns, true)?,
                    name: c.name,
                    keywords: c.keywords,
                    priority: c.priority,
                    min_confidence: c.min_confidence,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let special_rules = set
            .special_rules
            .into_iter()
            .map(|r| {
                Ok(SpecialRule {
                    filename_patterns: compile_all(&r.filename_patterns, true)?,
                    category: r.category,
                    content_keywords: r.content_keywords,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        let filename_keywords = set
            .filename_keywords
            .into_iter()
            .map(|f| FilenameKeywordRule {
                category: f.category,
                keywords: f.keywords.iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect();

        Ok(Self {
            standard_types,
            standard_code_patterns: compile_all(&set.standard_code_patterns, false)?,
            year_pattern: compile(&set.year_pattern, false)?,
            ev_keywords: set.ev_keywords,
            standard_keywords: set.standard_keywords,
            exclude_keywords: set.exclude_keywords,
            categories,
            category_exclude_keywords: set.category_exclude_keywords,
            special_rules,
            filename_keywords,
            exact_matches: ExactMatchTable::new(set.exact_matches),
            technical_category: set.technical_category,
            technical_keywords: set.technical_keywords,
        })
    }

    /// Built-in tables unless the config points at a rule file.
    pub fn from_config(cfg: &RuleConfig) -> Result<Self, ConfigurationError> {
        match &cfg.path {
            Some(path) => load_rule_table(Path::new(path)),
            None => Ok(Self::builtin()),
        }
    }

    pub fn category(&self, name: &str) -> Option<&CategoryRule> {
        self.categories.iter().find(|c| c.name == name)
    }
}

fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex, ConfigurationError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|source| ConfigurationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn compile_all(patterns: &[String], case_insensitive: bool) -> Result<Vec<Regex>, ConfigurationError> {
    patterns
        .iter()
        .map(|p| compile(p, case_insensitive))
        .collect()
}

pub fn load_rule_table(path: &Path) -> Result<KeywordRuleTable, ConfigurationError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigurationError::Rules {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let set: RuleSet = toml::from_str(&content).map_err(|e| ConfigurationError::Rules {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let table = KeywordRuleTable::from_set(set)?;
    info!(
        "loaded {} categories and {} exact matches from {:?}",
        table.categories.len(),
        table.exact_matches.len(),
        path
    );
    Ok(table)
}
