#![doc = include_str!("../README.md")]

// Public modules
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod pipeline;
pub mod types;

// Stage building blocks, usable on their own.
pub mod algorithms;
pub mod classify;
pub mod ensemble;
pub mod preprocess;
pub mod stain;

// --- High-level re-exports -------------------------------------------------

// Main entry points: pipeline + results.
pub use crate::pipeline::{DiagnosticPipeline, PipelineConfig, StageConfig};
pub use crate::types::DiagnosticResult;

pub use crate::diagnostics::{DetailedResult, PipelineDiagnostics};
pub use crate::error::{ConfigError, ConfigLoadError, InputValidationError};

// Plug-in surface for custom extractors.
pub use crate::algorithms::{
    extractor_fn, AlgorithmResult, AlgorithmSpec, Extractor, ExtractorCatalog,
};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use histo_ensemble::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let (w, h) = (64usize, 64usize);
/// let rgba = vec![200u8; w * h * 4];
/// let img = ImageRgba8::new(w, h, &rgba)?;
///
/// let pipeline = DiagnosticPipeline::new(PipelineConfig::default())?;
/// let result = pipeline.analyze(img)?;
/// println!("category={} score={:.3}", result.category, result.final_score);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::ImageRgba8;
    pub use crate::{
        AlgorithmResult, DiagnosticPipeline, DiagnosticResult, ExtractorCatalog, PipelineConfig,
    };
}
