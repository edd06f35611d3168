//! Error types.
//!
//! Two failure paths exist and they never mix:
//! - [`InputValidationError`] rejects a malformed image before any stage runs.
//! - [`ConfigError`] rejects an inconsistent [`crate::PipelineConfig`] once, when
//!   the pipeline is built.
//!
//! Sparse or ambiguous tissue is not an error at all; extractors report it
//! through [`crate::AlgorithmResult::error`] and the ensemble carries on.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed input image. No partial result is produced.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InputValidationError {
    #[error("image dimensions must be non-zero (got {width}x{height})")]
    EmptyDimensions { width: usize, height: usize },
    #[error("image dimensions {width}x{height} overflow the addressable buffer size")]
    DimensionOverflow { width: usize, height: usize },
    #[error("pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferLength {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("image {width}x{height} is below the minimum size {min_width}x{min_height}")]
    TooSmall {
        width: usize,
        height: usize,
        min_width: usize,
        min_height: usize,
    },
}

/// Inconsistent pipeline configuration.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("stage `{stage}` declares no algorithms")]
    EmptyStage { stage: String },
    #[error("algorithm `{name}` in stage `{stage}` has weight {weight}, expected a value in (0, 100]")]
    InvalidWeight {
        stage: String,
        name: String,
        weight: f32,
    },
    #[error("algorithm `{name}` is declared twice in stage `{stage}`")]
    DuplicateAlgorithm { stage: String, name: String },
    #[error("algorithm `{name}` is not registered in the extractor catalog")]
    UnknownAlgorithm { name: String },
    #[error("threshold table `{table}`: {reason}")]
    InvalidThresholdTable { table: String, reason: String },
    #[error("secondary threshold table name `{table}` is used twice")]
    DuplicateTable { table: String },
    #[error("integration weights must be non-negative and sum to 1 (math={math}, ai={ai})")]
    InvalidIntegrationWeights { math: f32, ai: f32 },
    #[error("confidence ceiling {0} must lie in (0, 1]")]
    InvalidConfidenceCeiling(f32),
    #[error("stain vector `{name}` must be finite and non-zero, got {vector:?}")]
    InvalidStainVector { name: &'static str, vector: [f32; 3] },
    #[error("optical density epsilon {0} must be finite and positive")]
    InvalidOdEpsilon(f32),
    #[error("optical density range {0} must be finite and positive")]
    InvalidOdRange(f32),
    #[error("minimum image size must be at least 1x1 (got {min_width}x{min_height})")]
    InvalidMinimumSize { min_width: usize, min_height: usize },
}

/// Failure to read or parse a JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
