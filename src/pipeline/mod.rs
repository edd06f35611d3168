//! End-to-end analysis of one RGBA tile.
//!
//! Stages, each run exactly once per call:
//! - Validate: reject malformed or undersized input before any work.
//! - Deconvolve: RGB → hematoxylin / eosin / residual optical densities.
//! - Preprocess: denoise, level scaling and equalisation per channel.
//! - Extract: run the math and AI algorithm tables (parallel under the
//!   `parallel` feature, results kept in declaration order).
//! - Aggregate: weighted average per stage.
//! - Integrate: blend the two stages, cap the confidence.
//! - Classify: category plus secondary labels from the threshold tables.
//!
//! Typical usage:
//! ```no_run
//! use histo_ensemble::{DiagnosticPipeline, PipelineConfig};
//! use histo_ensemble::image::ImageRgba8;
//!
//! # fn example(pixels: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = DiagnosticPipeline::new(PipelineConfig::default())?;
//! let image = ImageRgba8::new(256, 256, pixels)?;
//! let result = pipeline.analyze(image)?;
//! println!("{} ({:.3})", result.category, result.final_score);
//! # Ok(())
//! # }
//! ```

pub mod params;

pub use params::{InputOptions, PipelineConfig, StageConfig, WeightedAlgorithm};

use crate::algorithms::{AlgorithmOutcome, AlgorithmRegistry, AlgorithmSpec, ExtractorCatalog};
use crate::classify::{StageScores, ThresholdClassifier};
use crate::diagnostics::{
    ChannelStats, DetailedResult, InputDescriptor, PipelineDiagnostics, StageDiagnostics,
};
use crate::ensemble::{TwoStageIntegrator, WeightedEnsembleAggregator};
use crate::error::{ConfigError, InputValidationError};
use crate::image::ImageRgba8;
use crate::preprocess::ChannelPreprocessor;
use crate::stain::{StainChannel, StainChannels, StainDeconvolver};
use crate::types::DiagnosticResult;
use log::debug;

pub const MATH_STAGE: &str = "math";
pub const AI_STAGE: &str = "ai";

/// Validated, immutable analysis pipeline.
///
/// Construction resolves every algorithm name and checks every table, so
/// `analyze` can only fail on bad input. The pipeline holds no per-call
/// state and may be shared across threads.
#[derive(Debug)]
pub struct DiagnosticPipeline {
    config: PipelineConfig,
    deconvolver: StainDeconvolver,
    preprocessor: ChannelPreprocessor,
    math: Stage,
    ai: Stage,
    integrator: TwoStageIntegrator,
    classifier: ThresholdClassifier,
}

#[derive(Debug)]
struct Stage {
    registry: AlgorithmRegistry,
    aggregator: WeightedEnsembleAggregator,
}

impl Stage {
    fn new(
        name: &str,
        config: &StageConfig,
        specs: Vec<AlgorithmSpec>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            registry: AlgorithmRegistry::new(name, specs)?,
            aggregator: WeightedEnsembleAggregator::new(config.confidence_policy),
        })
    }

    fn diagnostics(&self, outcomes: &[AlgorithmOutcome]) -> StageDiagnostics {
        StageDiagnostics {
            stage: self.registry.stage().to_string(),
            algorithms: outcomes.len(),
            total_weight: self.registry.total_weight(),
            degraded: outcomes
                .iter()
                .filter(|o| o.result.is_degraded())
                .map(|o| o.name.clone())
                .collect(),
        }
    }
}

/// Intermediate products of one run, shared by the plain and detailed paths.
struct Run {
    result: DiagnosticResult,
    channels: StainChannels,
    math_outcomes: Vec<AlgorithmOutcome>,
    ai_outcomes: Vec<AlgorithmOutcome>,
}

impl DiagnosticPipeline {
    /// Build a pipeline whose algorithm names resolve against the built-in
    /// extractors.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        Self::with_catalog(config, &ExtractorCatalog::with_builtins())
    }

    /// Build a pipeline resolving algorithm names against `catalog`.
    pub fn with_catalog(
        config: PipelineConfig,
        catalog: &ExtractorCatalog,
    ) -> Result<Self, ConfigError> {
        let resolve = |stage: &StageConfig| -> Result<Vec<AlgorithmSpec>, ConfigError> {
            stage
                .algorithms
                .iter()
                .map(|a| catalog.resolve(&a.name, a.weight))
                .collect()
        };
        let math = resolve(&config.math)?;
        let ai = resolve(&config.ai)?;
        Self::from_specs(config, math, ai)
    }

    /// Build a pipeline from explicit extractor lists. The algorithm tables
    /// in `config.math` / `config.ai` are replaced by the names and weights
    /// of `math` / `ai`; their confidence policies are kept.
    pub fn from_specs(
        mut config: PipelineConfig,
        math: Vec<AlgorithmSpec>,
        ai: Vec<AlgorithmSpec>,
    ) -> Result<Self, ConfigError> {
        config.math.algorithms = weighted_algorithms(&math);
        config.ai.algorithms = weighted_algorithms(&ai);
        config.input.validate()?;
        let deconvolver = StainDeconvolver::new(&config.stain)?;
        let preprocessor = ChannelPreprocessor::new(config.preprocess.clone())?;
        let math = Stage::new(MATH_STAGE, &config.math, math)?;
        let ai = Stage::new(AI_STAGE, &config.ai, ai)?;
        let integrator = TwoStageIntegrator::new(config.integration.clone())?;
        let classifier =
            ThresholdClassifier::new(config.category.clone(), config.secondary.clone())?;
        Ok(Self {
            config,
            deconvolver,
            preprocessor,
            math,
            ai,
            integrator,
            classifier,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn math_registry(&self) -> &AlgorithmRegistry {
        &self.math.registry
    }

    pub fn ai_registry(&self) -> &AlgorithmRegistry {
        &self.ai.registry
    }

    /// Analyse one tile.
    pub fn analyze(&self, image: ImageRgba8<'_>) -> Result<DiagnosticResult, InputValidationError> {
        Ok(self.run(image)?.result)
    }

    /// Validate a raw RGBA8 buffer and analyse it.
    pub fn analyze_raw(
        &self,
        width: usize,
        height: usize,
        data: &[u8],
    ) -> Result<DiagnosticResult, InputValidationError> {
        self.analyze(ImageRgba8::new(width, height, data)?)
    }

    /// Analyse one tile and report per-stage diagnostics alongside the result.
    pub fn analyze_with_diagnostics(
        &self,
        image: ImageRgba8<'_>,
    ) -> Result<DetailedResult, InputValidationError> {
        Ok(self.analyze_with_channels(image)?.0)
    }

    /// Like [`Self::analyze_with_diagnostics`], also handing back the
    /// preprocessed channels the extractors ran on.
    pub fn analyze_with_channels(
        &self,
        image: ImageRgba8<'_>,
    ) -> Result<(DetailedResult, StainChannels), InputValidationError> {
        let input = InputDescriptor {
            width: image.width(),
            height: image.height(),
        };
        let run = self.run(image)?;
        let channels = StainChannel::ALL
            .iter()
            .map(|&c| ChannelStats::from_channel(c, run.channels.get(c)))
            .collect();
        let stages = vec![
            self.math.diagnostics(&run.math_outcomes),
            self.ai.diagnostics(&run.ai_outcomes),
        ];
        let detailed = DetailedResult {
            result: run.result,
            diagnostics: PipelineDiagnostics {
                input,
                channels,
                stages,
            },
        };
        Ok((detailed, run.channels))
    }

    /// Deconvolved and preprocessed channels, exactly as the extractors see
    /// them.
    pub fn preprocessed_channels(
        &self,
        image: ImageRgba8<'_>,
    ) -> Result<StainChannels, InputValidationError> {
        self.config.input.check(&image)?;
        let mut channels = self.deconvolver.deconvolve(image);
        self.preprocessor.apply(&mut channels);
        Ok(channels)
    }

    fn run(&self, image: ImageRgba8<'_>) -> Result<Run, InputValidationError> {
        let channels = self.preprocessed_channels(image)?;
        debug!(
            "pipeline: input {}x{} preprocessed",
            image.width(),
            image.height()
        );

        let math_outcomes = self.math.registry.run(&image, &channels);
        let ai_outcomes = self.ai.registry.run(&image, &channels);
        let math = self.math.aggregator.aggregate(&math_outcomes);
        let ai = self.ai.aggregator.aggregate(&ai_outcomes);
        debug!(
            "pipeline: math score={:.4} conf={:.4}; ai score={:.4} conf={:.4}",
            math.overall_score, math.confidence, ai.overall_score, ai.confidence
        );

        let integrated = self.integrator.integrate(&math, &ai);
        let labels = self.classifier.classify(&StageScores {
            final_score: integrated.final_score,
            math: math.overall_score,
            ai: ai.overall_score,
        });
        debug!(
            "pipeline: final score={:.4} conf={:.4} category={}",
            integrated.final_score, integrated.confidence, labels.category
        );

        Ok(Run {
            result: DiagnosticResult {
                final_score: integrated.final_score,
                confidence: integrated.confidence,
                category: labels.category,
                secondary_labels: labels.secondary_labels,
                math,
                ai,
            },
            channels,
            math_outcomes,
            ai_outcomes,
        })
    }
}

fn weighted_algorithms(specs: &[AlgorithmSpec]) -> Vec<WeightedAlgorithm> {
    specs
        .iter()
        .map(|spec| WeightedAlgorithm {
            name: spec.name.clone(),
            weight: spec.weight,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{extractor_fn, AlgorithmResult};

    fn constant(name: &str, weight: f32, score: f32, confidence: f32) -> AlgorithmSpec {
        AlgorithmSpec::new(
            name,
            weight,
            extractor_fn(move |_, _| AlgorithmResult::new(score, confidence)),
        )
    }

    #[test]
    fn unknown_algorithm_name_is_a_config_error() {
        let mut config = PipelineConfig::default();
        config.ai = StageConfig::new(&[("does_not_exist", 100.0)]);
        let err = DiagnosticPipeline::new(config).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownAlgorithm {
                name: "does_not_exist".into()
            }
        );
    }

    #[test]
    fn constant_extractors_flow_through_integration() {
        let pipeline = DiagnosticPipeline::from_specs(
            PipelineConfig::default(),
            vec![
                constant("a", 60.0, 0.8, 0.9),
                constant("b", 40.0, 0.6, 0.7),
            ],
            vec![constant("c", 100.0, 0.4, 0.5)],
        )
        .expect("valid pipeline");
        let data = vec![200u8; 8 * 8 * 4];
        let result = pipeline.analyze_raw(8, 8, &data).expect("valid input");

        assert!((result.math.overall_score - 0.72).abs() < 1e-5);
        assert!((result.ai.overall_score - 0.4).abs() < 1e-6);
        assert!((result.final_score - (0.72 * 0.75 + 0.4 * 0.25)).abs() < 1e-5);
        assert!((result.confidence - 0.5).abs() < 1e-6);
        assert_eq!(result.category, "suspicious");
        assert_eq!(
            result.secondary_labels.get("risk_tier").map(String::as_str),
            Some("high")
        );
        assert_eq!(
            result.secondary_labels.get("grade").map(String::as_str),
            Some("G2")
        );
    }

    #[test]
    fn diagnostics_report_every_channel_and_stage() {
        let pipeline = DiagnosticPipeline::from_specs(
            PipelineConfig::default(),
            vec![constant("a", 100.0, 0.5, 0.5)],
            vec![AlgorithmSpec::new(
                "empty",
                100.0,
                extractor_fn(|_, _| AlgorithmResult::insufficient("nuclei", 0, 10)),
            )],
        )
        .expect("valid pipeline");
        let data = vec![128u8; 6 * 5 * 4];
        let image = ImageRgba8::new(6, 5, &data).expect("valid buffer");
        let detailed = pipeline.analyze_with_diagnostics(image).expect("valid");
        let d = &detailed.diagnostics;
        assert_eq!((d.input.width, d.input.height), (6, 5));
        assert_eq!(d.channels.len(), 3);
        assert_eq!(d.stages[0].stage, MATH_STAGE);
        assert!(d.stages[0].degraded.is_empty());
        assert_eq!(d.stages[1].degraded, vec!["empty".to_string()]);
        assert_eq!(detailed.result.degraded_algorithms(), vec!["empty"]);
    }

    #[test]
    fn explicit_specs_replace_configured_tables() {
        let config = PipelineConfig::default();
        let policy = config.ai.confidence_policy;
        let pipeline = DiagnosticPipeline::from_specs(
            config,
            vec![constant("a", 60.0, 0.8, 0.9), constant("b", 40.0, 0.6, 0.7)],
            vec![constant("c", 100.0, 0.4, 0.5)],
        )
        .expect("valid pipeline");

        let math: Vec<(&str, f32)> = pipeline
            .config()
            .math
            .algorithms
            .iter()
            .map(|a| (a.name.as_str(), a.weight))
            .collect();
        assert_eq!(math, vec![("a", 60.0), ("b", 40.0)]);
        assert_eq!(pipeline.config().ai.algorithms.len(), 1);
        assert_eq!(pipeline.config().ai.algorithms[0].name, "c");
        assert_eq!(pipeline.config().ai.confidence_policy, policy);
    }

    #[test]
    fn detailed_run_returns_the_analysed_channels() {
        let pipeline = DiagnosticPipeline::new(PipelineConfig::default()).expect("defaults");
        let data: Vec<u8> = (0..12 * 10 * 4).map(|i| (i * 29 % 251) as u8).collect();
        let image = ImageRgba8::new(12, 10, &data).expect("valid buffer");

        let (detailed, channels) = pipeline.analyze_with_channels(image).expect("valid");

        assert_eq!(channels, pipeline.preprocessed_channels(image).expect("valid"));
        assert_eq!(detailed, pipeline.analyze_with_diagnostics(image).expect("valid"));
        for (stats, channel) in detailed.diagnostics.channels.iter().zip(StainChannel::ALL) {
            assert_eq!(stats.channel, channel);
            assert!(channels.level_span(channel).is_some());
        }
    }

    #[test]
    fn undersized_input_is_rejected_before_analysis() {
        let pipeline = DiagnosticPipeline::new(PipelineConfig::default()).expect("defaults");
        let data = vec![0u8; 3 * 3 * 4];
        let err = pipeline.analyze_raw(3, 3, &data).unwrap_err();
        assert!(matches!(err, InputValidationError::TooSmall { .. }));
    }
}
