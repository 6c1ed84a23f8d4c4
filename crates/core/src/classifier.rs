//! Multi-category decision over a filename and its extracted text.
//!
//! Stages run in a fixed order and the first one that produces a decision
//! wins: exact match, special rules, filename keywords, weighted keyword
//! scoring, technical fallback.

use crate::config::ScoringConfig;
use crate::models::{Categorization, DecisionStage};
use crate::rules::{CategoryRule, KeywordRuleTable};

const EXACT_MATCH_CONFIDENCE: f64 = 1.0;
const SPECIAL_WITH_CONTENT: f64 = 0.9;
const SPECIAL_FILENAME_ONLY: f64 = 0.7;
const FILENAME_KEYWORD_CONFIDENCE: f64 = 0.9;
const EXCLUDE_DECAY: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct DocumentClassifier<'a> {
    rules: &'a KeywordRuleTable,
    scoring: &'a ScoringConfig,
}

impl<'a> DocumentClassifier<'a> {
    pub fn new(rules: &'a KeywordRuleTable, scoring: &'a ScoringConfig) -> Self {
        Self { rules, scoring }
    }

    /// `None` means unclassified, which is not an error.
    pub fn classify(&self, filename: &str, text: &str) -> Option<Categorization> {
        if let Some(category) = self.rules.exact_matches.lookup(filename) {
            return Some(decision(category, EXACT_MATCH_CONFIDENCE, DecisionStage::ExactMatch));
        }

        let stem = file_stem(filename);
        let stem_lower = stem.to_lowercase();
        let text_lower = text.to_lowercase();

        if let Some(special) = self.special_rule(&stem_lower, &text_lower) {
            if special.confidence > SPECIAL_FILENAME_ONLY {
                return Some(special);
            }
        }

        if let Some(by_name) = self.filename_keyword(&stem_lower) {
            return Some(by_name);
        }

        let text_upper = text.to_uppercase();
        let best = self.best_scored(text, &text_upper);
        let needs_fallback = best
            .as_ref()
            .map_or(true, |b| b.confidence < self.scoring.fallback_threshold);
        if needs_fallback {
            if let Some(fallback) = self.technical_fallback(text) {
                return Some(fallback);
            }
        }
        best
    }

    /// First special rule whose filename pattern matches decides the outcome.
    pub fn special_rule(&self, stem_lower: &str, text_lower: &str) -> Option<Categorization> {
        let rule = self
            .rules
            .special_rules
            .iter()
            .find(|r| r.filename_patterns.iter().any(|p| p.is_match(stem_lower)))?;
        let content_hit = rule
            .content_keywords
            .iter()
            .any(|k| text_lower.contains(k.to_lowercase().as_str()));
        let confidence = if content_hit {
            SPECIAL_WITH_CONTENT
        } else {
            SPECIAL_FILENAME_ONLY
        };
        Some(decision(&rule.category, confidence, DecisionStage::SpecialRule))
    }

    pub fn filename_keyword(&self, stem_lower: &str) -> Option<Categorization> {
        self.rules
            .filename_keywords
            .iter()
            .find(|r| r.keywords.iter().any(|k| stem_lower.contains(k.as_str())))
            .map(|r| {
                decision(
                    &r.category,
                    FILENAME_KEYWORD_CONFIDENCE,
                    DecisionStage::FilenameKeyword,
                )
            })
    }

    /// Highest confidence among accepted categories, ties to higher priority.
    fn best_scored(&self, text: &str, text_upper: &str) -> Option<Categorization> {
        let excluded = self
            .rules
            .category_exclude_keywords
            .iter()
            .filter(|k| text_upper.contains(k.to_uppercase().as_str()))
            .count();

        let mut best: Option<(&CategoryRule, f64)> = None;
        for category in &self.rules.categories {
            let Some(confidence) = category_confidence(category, text, text_upper, excluded) else {
                continue;
            };
            if confidence < category.min_confidence {
                continue;
            }
            let better = match best {
                None => true,
                Some((current, best_confidence)) => {
                    confidence > best_confidence
                        || (confidence == best_confidence && category.priority > current.priority)
                }
            };
            if better {
                best = Some((category, confidence));
            }
        }
        best.map(|(category, confidence)| {
            decision(&category.name, confidence, DecisionStage::KeywordScore)
        })
    }

    fn technical_fallback(&self, text: &str) -> Option<Categorization> {
        let hits = self
            .rules
            .technical_keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .count();
        (hits >= self.scoring.fallback_min_hits).then(|| {
            decision(
                &self.rules.technical_category,
                self.scoring.fallback_confidence,
                DecisionStage::TechnicalFallback,
            )
        })
    }
}

/// Keyword/pattern score normalised by keyword count and decayed by the
/// number of exclude keywords present. `None` when nothing matched.
fn category_confidence(
    category: &CategoryRule,
    text: &str,
    text_upper: &str,
    excluded: usize,
) -> Option<f64> {
    let keyword_hits = category
        .keywords
        .iter()
        .filter(|k| text_upper.contains(k.to_uppercase().as_str()))
        .count() as f64;
    let pattern_hits = category.patterns.iter().filter(|p| p.is_match(text)).count() as f64;
    let score = keyword_hits + 0.5 * pattern_hits;
    if score <= 0.0 {
        return None;
    }
    let mut confidence = score / category.keywords.len().max(1) as f64;
    if excluded > 0 {
        confidence *= EXCLUDE_DECAY.powi(excluded as i32);
    }
    Some(confidence.min(1.0))
}

fn decision(category: &str, confidence: f64, stage: DecisionStage) -> Categorization {
    Categorization {
        category: category.to_string(),
        confidence,
        stage,
    }
}

/// Drops the extension only. Any `/` in the name stays part of the stem.
fn file_stem(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.trim_start_matches('.').is_empty() => stem,
        _ => filename,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    fn without_exact_matches() -> KeywordRuleTable {
        let mut set = RuleSet::builtin();
        set.exact_matches.clear();
        KeywordRuleTable::from_set(set).unwrap()
    }

    #[test]
    fn exact_match_ignores_content() {
        let rules = KeywordRuleTable::builtin();
        let scoring = ScoringConfig::default();
        let classifier = DocumentClassifier::new(&rules, &scoring);
        for text in ["", "合同 contract agreement 协议", "\u{0}\u{1}garbage"] {
            let result = classifier.classify("红外读头.pdf", text).unwrap();
            assert_eq!(result.category, "说明书");
            assert_eq!(result.confidence, 1.0);
            assert_eq!(result.stage, DecisionStage::ExactMatch);
        }
    }

    #[test]
    fn datasheet_filename_maps_to_chip_datasheet() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("ESP32_Datasheet.pdf", "")
            .unwrap();
        assert_eq!(result.category, "芯片数据手册");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.stage, DecisionStage::FilenameKeyword);
    }

    #[test]
    fn spec_sheet_keywords_win_over_chip_keywords() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let classifier = DocumentClassifier::new(&rules, &scoring);
        for name in ["芯片规格书.pdf", "chip_spec_v2.pdf"] {
            let result = classifier.classify(name, "").unwrap();
            assert_eq!(result.category, "规格书", "{name}");
            assert_eq!(result.stage, DecisionStage::FilenameKeyword);
        }
    }

    #[test]
    fn slash_in_filename_stays_in_stem() {
        assert_eq!(file_stem("合同/附件.pdf"), "合同/附件");
        assert_eq!(file_stem("v1.2/readme"), "v1.2/readme");
        assert_eq!(file_stem(".hidden"), ".hidden");
        assert_eq!(file_stem("report.final.pdf"), "report.final");

        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("合同/附件.pdf", "")
            .unwrap();
        assert_eq!(result.category, "合同");
        assert_eq!(result.confidence, 0.9);
    }

    #[test]
    fn reply_letter_without_keywords_is_unclassified() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let classifier = DocumentClassifier::new(&rules, &scoring);
        assert_eq!(classifier.classify("永联科技回复.pdf", ""), None);
        // The special rule still recognises the name, at the filename-only tier.
        let special = classifier.special_rule("永联科技回复", "").unwrap();
        assert_eq!(special.category, "其他");
        assert_eq!(special.confidence, 0.7);
    }

    #[test]
    fn special_rule_with_content_short_circuits() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("逆变器MODBUS点表.pdf", "本文档描述 Modbus 寄存器")
            .unwrap();
        assert_eq!(result.category, "设备通讯协议");
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.stage, DecisionStage::SpecialRule);
    }

    #[test]
    fn weighted_scoring_prefers_priority_on_ties() {
        let mut set = RuleSet::builtin();
        set.exact_matches.clear();
        set.special_rules.clear();
        set.filename_keywords.clear();
        set.category_exclude_keywords.clear();
        set.technical_keywords.clear();
        set.categories = vec![
            crate::rules::CategorySpec {
                name: "low".into(),
                keywords: vec!["alpha".into()],
                patterns: vec![],
                priority: 1,
                min_confidence: 0.4,
            },
            crate::rules::CategorySpec {
                name: "high".into(),
                keywords: vec!["ALPHA".into()],
                patterns: vec![],
                priority: 5,
                min_confidence: 0.4,
            },
        ];
        let rules = KeywordRuleTable::from_set(set).unwrap();
        let scoring = ScoringConfig::default();
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("x.pdf", "Alpha release notes")
            .unwrap();
        assert_eq!(result.category, "high");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.stage, DecisionStage::KeywordScore);
    }

    #[test]
    fn exclude_keywords_decay_multiplicatively() {
        let mut set = RuleSet::builtin();
        set.exact_matches.clear();
        set.special_rules.clear();
        set.filename_keywords.clear();
        set.technical_keywords.clear();
        set.category_exclude_keywords = vec!["noise".into(), "hum".into()];
        set.categories = vec![crate::rules::CategorySpec {
            name: "paper".into(),
            keywords: vec!["abstract".into(), "references".into()],
            patterns: vec![],
            priority: 1,
            min_confidence: 0.1,
        }];
        let rules = KeywordRuleTable::from_set(set).unwrap();
        let scoring = ScoringConfig::default();
        let classifier = DocumentClassifier::new(&rules, &scoring);
        let clean = classifier.classify("x.pdf", "Abstract ... References").unwrap();
        assert_eq!(clean.confidence, 1.0);
        let noisy = classifier
            .classify("x.pdf", "Abstract ... References ... noise, HUM, noise")
            .unwrap();
        // Distinct exclude keywords: 0.9^2
        assert!((noisy.confidence - 0.81).abs() < 1e-9);
    }

    #[test]
    fn below_min_confidence_is_rejected() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        // One of six 国标 keywords: 1/6 is under its 0.6 threshold.
        assert_eq!(DocumentClassifier::new(&rules, &scoring).classify("x.pdf", "国家标准"), None);
    }

    #[test]
    fn weak_score_stands_when_fallback_does_not_fire() {
        let mut set = RuleSet::builtin();
        set.exact_matches.clear();
        set.special_rules.clear();
        set.filename_keywords.clear();
        set.category_exclude_keywords.clear();
        set.categories = vec![crate::rules::CategorySpec {
            name: "memo".into(),
            keywords: vec![
                "memo".into(),
                "minutes".into(),
                "agenda".into(),
                "attendees".into(),
                "action items".into(),
                "next meeting".into(),
            ],
            patterns: vec![],
            priority: 1,
            min_confidence: 0.1,
        }];
        let rules = KeywordRuleTable::from_set(set).unwrap();
        let scoring = ScoringConfig::default();
        // One technical keyword only, so the fallback stays off.
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("x.pdf", "Agenda for the 设计 review")
            .unwrap();
        assert_eq!(result.category, "memo");
        assert_eq!(result.stage, DecisionStage::KeywordScore);
        assert!((result.confidence - 1.0 / 6.0).abs() < 1e-9);
        assert!(result.confidence < scoring.fallback_threshold);
    }

    #[test]
    fn technical_fallback_rescues_weak_documents() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let result = DocumentClassifier::new(&rules, &scoring)
            .classify("notes-01.pdf", "本项目的配置参数见附表")
            .unwrap();
        assert_eq!(result.category, "技术文档");
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.stage, DecisionStage::TechnicalFallback);
    }

    #[test]
    fn empty_input_has_no_category() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        assert_eq!(DocumentClassifier::new(&rules, &scoring).classify("unknown.pdf", ""), None);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let rules = without_exact_matches();
        let scoring = ScoringConfig::default();
        let classifier = DocumentClassifier::new(&rules, &scoring);
        let texts = [
            "GB/T 国家标准 国家市场监督管理总局 国家标准化管理委员会 中华人民共和国国家标准 GB 1234",
            "modbus 通信协议 通讯协议 接口协议 通信规约 通讯规约 通信接口",
            "技术 规范 要求 方案 标准 规格 参数 配置 设计 开发",
            "",
        ];
        for text in texts {
            if let Some(result) = classifier.classify("plain.pdf", text) {
                assert!((0.0..=1.0).contains(&result.confidence), "{text}");
            }
            assert_eq!(classifier.classify("plain.pdf", text), classifier.classify("plain.pdf", text));
        }
    }
}
