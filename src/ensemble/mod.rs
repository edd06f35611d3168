//! Two-layer score combination.
//!
//! Each stage's algorithm outcomes are reduced to one [`EnsembleResult`] by
//! the [`WeightedEnsembleAggregator`]; the [`TwoStageIntegrator`] then blends
//! the math and AI ensembles into the final score and confidence.

mod aggregator;
mod integrator;

pub use aggregator::{ConfidencePolicy, EnsembleResult, WeightedEnsembleAggregator};
pub use integrator::{IntegratedScore, IntegrationOptions, TwoStageIntegrator};
