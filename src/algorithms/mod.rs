//! Pluggable feature-extraction algorithms and their execution harness.
//!
//! - [`Extractor`]: the plug-in contract, a pure function of the input image
//!   and its preprocessed stain channels.
//! - [`AlgorithmResult`]: the single result type every plug-in returns.
//! - [`AlgorithmRegistry`]: an ordered, weighted, validated list of
//!   extractors forming one ensemble stage; [`AlgorithmRegistry::run`]
//!   executes them, on the rayon pool when `parallel` is enabled.
//! - [`ExtractorCatalog`]: resolves algorithm names from configuration.
//! - [`builtin`]: reference extractors.

pub mod builtin;
mod catalog;
mod registry;
mod result;

pub use catalog::ExtractorCatalog;
pub use registry::{
    extractor_fn, AlgorithmOutcome, AlgorithmRegistry, AlgorithmSpec, Extractor, MAX_WEIGHT,
    NOMINAL_WEIGHT_SUM,
};
pub use result::{
    clamp_unit, AlgorithmResult, FeatureValue, DEGRADED_CONFIDENCE, DEGRADED_SCORE,
};
