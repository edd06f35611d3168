use super::result::AlgorithmResult;
use crate::error::ConfigError;
use crate::image::ImageRgba8;
use crate::stain::StainChannels;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Largest weight a single algorithm may declare.
pub const MAX_WEIGHT: f32 = 100.0;
/// Nominal weight total of one stage.
pub const NOMINAL_WEIGHT_SUM: f32 = 100.0;
const WEIGHT_SUM_TOLERANCE: f32 = 0.5;

/// A feature-extraction plug-in.
///
/// Implementations must be pure: the same image and channels always yield
/// the same result, and no state is shared between calls. When the image
/// holds too little structure they return a degraded result (see
/// [`AlgorithmResult::insufficient`]) instead of panicking.
pub trait Extractor: Send + Sync {
    fn extract(&self, image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult;
}

impl<F> Extractor for F
where
    F: Fn(&ImageRgba8<'_>, &StainChannels) -> AlgorithmResult + Send + Sync,
{
    fn extract(&self, image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult {
        self(image, channels)
    }
}

/// Wrap a closure as a shared extractor.
pub fn extractor_fn<F>(f: F) -> Arc<dyn Extractor>
where
    F: Fn(&ImageRgba8<'_>, &StainChannels) -> AlgorithmResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A named, weighted extractor within one ensemble stage.
#[derive(Clone)]
pub struct AlgorithmSpec {
    pub name: String,
    pub weight: f32,
    pub extractor: Arc<dyn Extractor>,
}

impl AlgorithmSpec {
    pub fn new(name: impl Into<String>, weight: f32, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            name: name.into(),
            weight,
            extractor,
        }
    }
}

impl fmt::Debug for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlgorithmSpec")
            .field("name", &self.name)
            .field("weight", &self.weight)
            .finish_non_exhaustive()
    }
}

/// Output of one extractor together with its declared weight.
#[derive(Clone, Debug, PartialEq)]
pub struct AlgorithmOutcome {
    pub name: String,
    pub weight: f32,
    pub result: AlgorithmResult,
}

/// Ordered, validated list of algorithms forming one ensemble stage.
#[derive(Clone, Debug)]
pub struct AlgorithmRegistry {
    stage: String,
    specs: Vec<AlgorithmSpec>,
}

impl AlgorithmRegistry {
    /// Validate and wrap a stage. Weights must lie in `(0, 100]` and names
    /// must be unique; the weights need not sum to 100.
    pub fn new(stage: impl Into<String>, specs: Vec<AlgorithmSpec>) -> Result<Self, ConfigError> {
        let stage = stage.into();
        if specs.is_empty() {
            return Err(ConfigError::EmptyStage { stage });
        }
        let mut seen = BTreeSet::new();
        for spec in &specs {
            if !spec.weight.is_finite() || spec.weight <= 0.0 || spec.weight > MAX_WEIGHT {
                return Err(ConfigError::InvalidWeight {
                    stage,
                    name: spec.name.clone(),
                    weight: spec.weight,
                });
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateAlgorithm {
                    stage,
                    name: spec.name.clone(),
                });
            }
        }
        let registry = Self { stage, specs };
        let total = registry.total_weight();
        if (total - NOMINAL_WEIGHT_SUM).abs() > WEIGHT_SUM_TOLERANCE {
            warn!(
                "stage `{}` weights sum to {:.2} instead of {}; scores are normalised by the actual sum",
                registry.stage, total, NOMINAL_WEIGHT_SUM
            );
        }
        Ok(registry)
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn specs(&self) -> &[AlgorithmSpec] {
        &self.specs
    }

    pub fn total_weight(&self) -> f32 {
        self.specs.iter().map(|s| s.weight).sum()
    }

    /// Run every extractor and return outcomes in declaration order.
    ///
    /// Scores and confidences are clamped to `[0, 1]`. An extractor that
    /// panics is reported as a degraded outcome rather than tearing down the
    /// whole analysis.
    pub fn run(&self, image: &ImageRgba8<'_>, channels: &StainChannels) -> Vec<AlgorithmOutcome> {
        #[cfg(feature = "parallel")]
        let outcomes: Vec<AlgorithmOutcome> = self
            .specs
            .par_iter()
            .map(|spec| run_one(spec, image, channels))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<AlgorithmOutcome> = self
            .specs
            .iter()
            .map(|spec| run_one(spec, image, channels))
            .collect();

        for outcome in &outcomes {
            debug!(
                "stage={} algorithm={} score={:.4} confidence={:.4} degraded={}",
                self.stage,
                outcome.name,
                outcome.result.score,
                outcome.result.confidence,
                outcome.result.is_degraded()
            );
        }
        outcomes
    }
}

fn run_one(
    spec: &AlgorithmSpec,
    image: &ImageRgba8<'_>,
    channels: &StainChannels,
) -> AlgorithmOutcome {
    let result = catch_unwind(AssertUnwindSafe(|| spec.extractor.extract(image, channels)))
        .unwrap_or_else(|_| {
            AlgorithmResult::degraded(format!("extractor `{}` panicked", spec.name))
        });
    AlgorithmOutcome {
        name: spec.name.clone(),
        weight: spec.weight,
        result: result.sanitized(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(score: f32, confidence: f32) -> Arc<dyn Extractor> {
        extractor_fn(move |_, _| AlgorithmResult::new(score, confidence))
    }

    fn tiny_image(data: &[u8]) -> ImageRgba8<'_> {
        ImageRgba8::new(2, 2, data).expect("valid 2x2 image")
    }

    #[test]
    fn rejects_out_of_range_weights() {
        for weight in [0.0, -1.0, 100.5, f32::NAN] {
            let spec = AlgorithmSpec::new("a", weight, constant(0.5, 0.5));
            let err = AlgorithmRegistry::new("math", vec![spec]).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidWeight { .. }), "{weight}");
        }
    }

    #[test]
    fn rejects_duplicates_and_empty_stages() {
        let err = AlgorithmRegistry::new(
            "ai",
            vec![
                AlgorithmSpec::new("a", 50.0, constant(0.5, 0.5)),
                AlgorithmSpec::new("a", 50.0, constant(0.5, 0.5)),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateAlgorithm { .. }));
        assert!(matches!(
            AlgorithmRegistry::new("ai", Vec::new()),
            Err(ConfigError::EmptyStage { .. })
        ));
    }

    #[test]
    fn run_preserves_declaration_order() {
        let registry = AlgorithmRegistry::new(
            "math",
            (0..8)
                .map(|i| {
                    AlgorithmSpec::new(format!("alg{i}"), 12.5, constant(i as f32 / 10.0, 0.5))
                })
                .collect(),
        )
        .expect("valid registry");
        let data = vec![0u8; 16];
        let image = tiny_image(&data);
        let channels = StainChannels::new(2, 2);
        let outcomes = registry.run(&image, &channels);
        let names: Vec<_> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["alg0", "alg1", "alg2", "alg3", "alg4", "alg5", "alg6", "alg7"]
        );
        assert!((registry.total_weight() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_results_are_clamped() {
        let raw = extractor_fn(|_, _| {
            let mut r = AlgorithmResult::new(0.0, 0.0);
            r.score = 3.0;
            r.confidence = -2.0;
            r
        });
        let registry = AlgorithmRegistry::new("math", vec![AlgorithmSpec::new("raw", 100.0, raw)])
            .expect("valid");
        let data = vec![0u8; 16];
        let outcomes = registry.run(&tiny_image(&data), &StainChannels::new(2, 2));
        assert_eq!(outcomes[0].result.score, 1.0);
        assert_eq!(outcomes[0].result.confidence, 0.0);
    }

    #[test]
    fn panicking_extractor_degrades() {
        let boom = extractor_fn(|_, _| -> AlgorithmResult { panic!("boom") });
        let registry = AlgorithmRegistry::new("ai", vec![AlgorithmSpec::new("boom", 100.0, boom)])
            .expect("valid");
        let data = vec![0u8; 16];
        let outcomes = registry.run(&tiny_image(&data), &StainChannels::new(2, 2));
        assert!(outcomes[0].result.is_degraded());
    }
}
