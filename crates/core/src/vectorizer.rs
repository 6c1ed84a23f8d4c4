//! Fixed-order numeric view of a [`FeatureRecord`] for the classifier.

use crate::models::{FeatureRecord, StandardType};

/// Names and normalisers of the features after the one-hot block.
const SCALAR_FEATURES: [&str; 10] = [
    "has_standard_code",
    "has_year",
    "ev_related",
    "standard_related",
    "text_length_norm",
    "std_keywords_norm",
    "ev_keywords_norm",
    "exclude_keywords_norm",
    "std_sections_norm",
    "ev_sections_norm",
];

pub const FEATURE_COUNT: usize = StandardType::ALL.len() + SCALAR_FEATURES.len();

/// Column names in vector order.
pub fn feature_names() -> Vec<String> {
    StandardType::ALL
        .iter()
        .map(|t| format!("std_type_{}", t.code()))
        .chain(SCALAR_FEATURES.iter().map(|s| s.to_string()))
        .collect()
}

pub fn build_feature_vector(record: &FeatureRecord) -> Vec<f64> {
    let name = &record.filename_features;
    let content = &record.content_features;

    let mut vector = Vec::with_capacity(FEATURE_COUNT);
    for kind in StandardType::ALL {
        vector.push(flag(name.standard_type == Some(kind)));
    }
    vector.push(flag(name.standard_code.is_some()));
    vector.push(flag(name.year.is_some()));
    vector.push(flag(name.ev_related));
    vector.push(flag(name.standard_related));
    vector.push(ratio(content.text_length(), 10_000.0));
    vector.push(ratio(content.standard_keywords_count(), 50.0));
    vector.push(ratio(content.ev_keywords_count(), 30.0));
    vector.push(ratio(content.exclude_keywords_count(), 20.0));
    vector.push(ratio(content.standard_sections().len(), 10.0));
    vector.push(ratio(content.ev_sections().len(), 10.0));
    vector
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn ratio(count: usize, scale: f64) -> f64 {
    (count as f64 / scale).clamp(0.0, 1.0)
}
