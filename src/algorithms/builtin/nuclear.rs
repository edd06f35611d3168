use super::blobs::{detect_blobs, BlobLimits};
use super::{mean_and_cv, support_confidence};
use crate::algorithms::{AlgorithmResult, Extractor};
use crate::image::ImageRgba8;
use crate::stain::StainChannels;

/// Fraction of tissue covered by nuclei at which the density score saturates.
const REFERENCE_COVERAGE: f32 = 0.35;
/// Area coefficient of variation at which the pleomorphism score saturates.
const REFERENCE_AREA_CV: f32 = 0.8;

/// Nuclear coverage of the hematoxylin channel.
#[derive(Clone, Debug)]
pub struct NuclearDensity {
    pub min_nuclei: usize,
    pub limits: BlobLimits,
}

impl Default for NuclearDensity {
    fn default() -> Self {
        Self {
            min_nuclei: 15,
            limits: BlobLimits::default(),
        }
    }
}

impl Extractor for NuclearDensity {
    fn extract(&self, _image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult {
        let blobs = detect_blobs(&channels.hematoxylin, self.limits);
        if blobs.len() < self.min_nuclei {
            return AlgorithmResult::insufficient("nuclei", blobs.len(), self.min_nuclei);
        }
        let pixels = (channels.width() * channels.height()) as f32;
        let covered: usize = blobs.iter().map(|b| b.area).sum();
        let coverage = covered as f32 / pixels;
        let per_kilopixel = blobs.len() as f32 * 1000.0 / pixels;

        AlgorithmResult::new(
            coverage / REFERENCE_COVERAGE,
            support_confidence(blobs.len(), self.min_nuclei),
        )
        .with_feature("nuclei", blobs.len())
        .with_feature("coverage", coverage)
        .with_feature("nuclei_per_kilopixel", per_kilopixel)
    }
}

/// Variation in nuclear size.
#[derive(Clone, Debug)]
pub struct NuclearPleomorphism {
    pub min_nuclei: usize,
    pub limits: BlobLimits,
}

impl Default for NuclearPleomorphism {
    fn default() -> Self {
        Self {
            min_nuclei: 15,
            limits: BlobLimits::default(),
        }
    }
}

impl Extractor for NuclearPleomorphism {
    fn extract(&self, _image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult {
        let blobs = detect_blobs(&channels.hematoxylin, self.limits);
        if blobs.len() < self.min_nuclei {
            return AlgorithmResult::insufficient("nuclei", blobs.len(), self.min_nuclei);
        }
        let (mean_area, area_cv) = mean_and_cv(blobs.iter().map(|b| b.area as f64));
        let (mean_level, level_cv) = mean_and_cv(blobs.iter().map(|b| b.mean_level as f64));

        AlgorithmResult::new(
            area_cv as f32 / REFERENCE_AREA_CV,
            support_confidence(blobs.len(), self.min_nuclei),
        )
        .with_feature("nuclei", blobs.len())
        .with_feature("mean_area", mean_area)
        .with_feature("area_cv", area_cv)
        .with_feature("mean_level", mean_level)
        .with_feature("level_cv", level_cv)
    }
}
