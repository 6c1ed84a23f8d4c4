//! Fixed linear score for "is this a standard document".

use crate::models::{ContentFeatures, FilenameFeatures};

const STANDARD_TYPE_WEIGHT: f64 = 0.4;
const STANDARD_CODE_WEIGHT: f64 = 0.2;
const STANDARD_RELATED_WEIGHT: f64 = 0.1;
const EV_RELATED_WEIGHT: f64 = 0.1;

/// Returns `(is_standard, confidence)`; confidence is clamped to `[0, 1]`.
pub fn standard_confidence(
    filename: &FilenameFeatures,
    content: &ContentFeatures,
    min_confidence: f64,
) -> (bool, f64) {
    let mut confidence = 0.0;

    if filename.standard_type.is_some() {
        confidence += STANDARD_TYPE_WEIGHT;
    }
    if filename.standard_code.is_some() {
        confidence += STANDARD_CODE_WEIGHT;
    }
    if filename.standard_related {
        confidence += STANDARD_RELATED_WEIGHT;
    }
    if filename.ev_related {
        confidence += EV_RELATED_WEIGHT;
    }

    if let Some(stats) = content.stats() {
        confidence += content_adjustment(
            stats.standard_keywords_count,
            stats.ev_keywords_count,
            stats.exclude_keywords_count,
        );
    }

    let confidence = confidence.clamp(0.0, 1.0);
    (confidence >= min_confidence, confidence)
}

fn content_adjustment(standard: usize, ev: usize, exclude: usize) -> f64 {
    let mut delta = 0.0;
    if standard > 0 {
        delta += (standard as f64 * 0.01).min(0.2);
    }
    if ev > 0 {
        delta += (ev as f64 * 0.005).min(0.1);
    }
    if exclude > 0 {
        delta -= (exclude as f64 * 0.02).min(0.3);
    }
    delta
}
