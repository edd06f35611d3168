//! Configuration of the analysis pipeline.
//!
//! Everything that differs between diagnostic domains lives here as data:
//! the stain basis, the two algorithm tables with their weights, the
//! integration weights and the threshold tables. `Default` is a generic
//! H&E profile built from the reference extractors.

use crate::algorithms::builtin::{
    ARCHITECTURAL_DISORDER, CHROMATIN_TEXTURE, NUCLEAR_DENSITY, NUCLEAR_PLEOMORPHISM,
    STROMAL_TEXTURE,
};
use crate::classify::{Bracket, ScoreSource, ThresholdTable};
use crate::ensemble::{ConfidencePolicy, IntegrationOptions};
use crate::error::{ConfigError, InputValidationError};
use crate::image::ImageRgba8;
use crate::preprocess::PreprocessOptions;
use crate::stain::StainOptions;
use serde::{Deserialize, Serialize};

/// Pipeline-wide parameters.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputOptions,
    pub stain: StainOptions,
    pub preprocess: PreprocessOptions,
    /// First ensemble ("mathematical" measurements).
    pub math: StageConfig,
    /// Second ensemble ("AI" pattern measurements).
    pub ai: StageConfig,
    pub integration: IntegrationOptions,
    /// Table producing `DiagnosticResult::category`.
    pub category: ThresholdTable,
    /// Tables producing `DiagnosticResult::secondary_labels`, keyed by name.
    pub secondary: Vec<ThresholdTable>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: InputOptions::default(),
            stain: StainOptions::default(),
            preprocess: PreprocessOptions::default(),
            math: StageConfig::new(&[
                (NUCLEAR_DENSITY, 40.0),
                (NUCLEAR_PLEOMORPHISM, 35.0),
                (CHROMATIN_TEXTURE, 25.0),
            ]),
            ai: StageConfig::new(&[(ARCHITECTURAL_DISORDER, 60.0), (STROMAL_TEXTURE, 40.0)]),
            integration: IntegrationOptions::default(),
            category: table(
                "category",
                ScoreSource::Final,
                &[
                    (0.75, "malignant"),
                    (0.5, "suspicious"),
                    (0.3, "atypical"),
                    (0.0, "benign"),
                ],
            ),
            secondary: vec![
                table(
                    "grade",
                    ScoreSource::Final,
                    &[(0.66, "G3"), (0.33, "G2"), (0.0, "G1")],
                ),
                table(
                    "risk_tier",
                    ScoreSource::Math,
                    &[(0.6, "high"), (0.3, "intermediate"), (0.0, "low")],
                ),
            ],
        }
    }
}

fn table(name: &str, source: ScoreSource, brackets: &[(f32, &str)]) -> ThresholdTable {
    ThresholdTable {
        name: name.to_string(),
        source,
        brackets: brackets
            .iter()
            .map(|&(bound, label)| Bracket::new(bound, label))
            .collect(),
    }
}

/// Minimum accepted image size.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InputOptions {
    pub min_width: usize,
    pub min_height: usize,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            min_width: 4,
            min_height: 4,
        }
    }
}

impl InputOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_width == 0 || self.min_height == 0 {
            return Err(ConfigError::InvalidMinimumSize {
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        Ok(())
    }

    pub fn check(&self, image: &ImageRgba8<'_>) -> Result<(), InputValidationError> {
        if image.width() < self.min_width || image.height() < self.min_height {
            return Err(InputValidationError::TooSmall {
                width: image.width(),
                height: image.height(),
                min_width: self.min_width,
                min_height: self.min_height,
            });
        }
        Ok(())
    }
}

/// One configured algorithm: a catalog name and its weight.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct WeightedAlgorithm {
    pub name: String,
    pub weight: f32,
}

/// Algorithm table and confidence policy of one ensemble stage.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct StageConfig {
    pub algorithms: Vec<WeightedAlgorithm>,
    #[serde(default)]
    pub confidence_policy: ConfidencePolicy,
}

impl StageConfig {
    pub fn new(algorithms: &[(&str, f32)]) -> Self {
        Self {
            algorithms: algorithms
                .iter()
                .map(|&(name, weight)| WeightedAlgorithm {
                    name: name.to_string(),
                    weight,
                })
                .collect(),
            confidence_policy: ConfidencePolicy::Mean,
        }
    }

    pub fn with_policy(mut self, policy: ConfidencePolicy) -> Self {
        self.confidence_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_are_valid() {
        let config = PipelineConfig::default();
        config.category.validate().expect("category table");
        for t in &config.secondary {
            t.validate().expect("secondary table");
        }
        let math_sum: f32 = config.math.algorithms.iter().map(|a| a.weight).sum();
        let ai_sum: f32 = config.ai.algorithms.iter().map(|a| a.weight).sum();
        assert_eq!(math_sum, 100.0);
        assert_eq!(ai_sum, 100.0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "integration": { "math_weight": 0.8, "ai_weight": 0.2 } }"#;
        let config: PipelineConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(config.integration.math_weight, 0.8);
        assert_eq!(config.integration.confidence_ceiling, 0.97);
        assert_eq!(config.math, PipelineConfig::default().math);
    }

    #[test]
    fn json_round_trip_preserves_config() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).expect("serialize");
        let back: PipelineConfig = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, config);
    }

    #[test]
    fn minimum_size_is_enforced() {
        let data = vec![0u8; 3 * 8 * 4];
        let image = ImageRgba8::new(3, 8, &data).expect("valid buffer");
        let err = InputOptions::default().check(&image).unwrap_err();
        assert!(matches!(err, InputValidationError::TooSmall { .. }));
    }
}
