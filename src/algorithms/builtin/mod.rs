//! Reference extractors shipped with the crate.
//!
//! They implement the [`Extractor`](crate::algorithms::Extractor) contract on
//! top of simple structure detection (Otsu blobs and Sobel edges) on the
//! preprocessed channels. Their scores are heuristics; they exist so the
//! pipeline runs end to end and so custom plug-ins have a template.
//!
//! | name | channel | structure | minimum |
//! |---|---|---|---|
//! | `nuclear_density` | hematoxylin | blobs | 15 |
//! | `nuclear_pleomorphism` | hematoxylin | blobs | 15 |
//! | `chromatin_texture` | hematoxylin | edge pixels | 20 |
//! | `architectural_disorder` | hematoxylin | blobs | 20 |
//! | `stromal_texture` | eosin | edge pixels | 20 |
//!
//! The texture extractors also require a pre-equalisation level span of at
//! least [`MIN_LEVEL_SPAN`] on their channel.

mod architecture;
pub mod blobs;
pub mod gradient;
mod nuclear;
mod texture;

pub use architecture::ArchitecturalDisorder;
pub use blobs::{detect_blobs, Blob, BlobLimits};
pub use nuclear::{NuclearDensity, NuclearPleomorphism};
pub use texture::{EdgeTexture, MIN_LEVEL_SPAN};

use super::catalog::ExtractorCatalog;
use std::sync::Arc;

pub const NUCLEAR_DENSITY: &str = "nuclear_density";
pub const NUCLEAR_PLEOMORPHISM: &str = "nuclear_pleomorphism";
pub const CHROMATIN_TEXTURE: &str = "chromatin_texture";
pub const ARCHITECTURAL_DISORDER: &str = "architectural_disorder";
pub const STROMAL_TEXTURE: &str = "stromal_texture";

/// Register every reference extractor under its canonical name.
pub fn register_builtins(catalog: &mut ExtractorCatalog) {
    catalog.register(NUCLEAR_DENSITY, Arc::new(NuclearDensity::default()));
    catalog.register(NUCLEAR_PLEOMORPHISM, Arc::new(NuclearPleomorphism::default()));
    catalog.register(CHROMATIN_TEXTURE, Arc::new(EdgeTexture::chromatin()));
    catalog.register(ARCHITECTURAL_DISORDER, Arc::new(ArchitecturalDisorder::default()));
    catalog.register(STROMAL_TEXTURE, Arc::new(EdgeTexture::stromal()));
}

/// Confidence grows with how far the structure count clears the minimum,
/// from ~0.54 at the minimum to 0.95 at four times the minimum.
pub(crate) fn support_confidence(found: usize, required: usize) -> f32 {
    let ratio = found as f32 / (4 * required.max(1)) as f32;
    0.4 + 0.55 * ratio.min(1.0)
}

/// Mean and coefficient of variation (population std-dev / mean).
pub(crate) fn mean_and_cv(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let (n, sum) = values.clone().fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    if mean.abs() <= f64::EPSILON {
        return (mean, 0.0);
    }
    let var = values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
    (mean, var.sqrt() / mean)
}
