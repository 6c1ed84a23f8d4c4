//! Core library: rule tables, feature extraction, scoring, the standard
//! classifier and batch pipelines.

mod builtin;
pub mod classifier;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod forest;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod scaler;
pub mod scanner;
pub mod scoring;
pub mod trainer;
pub mod vectorizer;
