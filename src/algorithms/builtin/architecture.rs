use super::blobs::{detect_blobs, Blob, BlobLimits};
use super::{mean_and_cv, support_confidence};
use crate::algorithms::{AlgorithmResult, Extractor};
use crate::image::ImageRgba8;
use crate::stain::StainChannels;
use std::cmp::Ordering;

/// Nearest-neighbour spacing CV at which the disorder score saturates.
const REFERENCE_SPACING_CV: f32 = 0.6;

/// Irregularity of nuclear placement.
///
/// Regularly spaced nuclei have near-identical nearest-neighbour distances
/// (CV close to zero); crowded, disorganised tissue spreads them out.
#[derive(Clone, Debug)]
pub struct ArchitecturalDisorder {
    pub min_nuclei: usize,
    pub limits: BlobLimits,
}

impl Default for ArchitecturalDisorder {
    fn default() -> Self {
        Self {
            min_nuclei: 20,
            limits: BlobLimits::default(),
        }
    }
}

impl Extractor for ArchitecturalDisorder {
    fn extract(&self, _image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult {
        let blobs = detect_blobs(&channels.hematoxylin, self.limits);
        if blobs.len() < self.min_nuclei {
            return AlgorithmResult::insufficient("nuclei", blobs.len(), self.min_nuclei);
        }
        let distances = nearest_neighbour_distances(&blobs);
        let (mean_spacing, spacing_cv) = mean_and_cv(distances.iter().map(|&d| d as f64));

        AlgorithmResult::new(
            spacing_cv as f32 / REFERENCE_SPACING_CV,
            support_confidence(blobs.len(), self.min_nuclei),
        )
        .with_feature("nuclei", blobs.len())
        .with_feature("mean_spacing", mean_spacing)
        .with_feature("spacing_cv", spacing_cv)
    }
}

/// Distance from every centroid to its nearest other centroid.
///
/// Points are swept in x order; the scan around each point stops once the
/// x gap alone exceeds the best distance found so far.
pub(crate) fn nearest_neighbour_distances(blobs: &[Blob]) -> Vec<f32> {
    let mut points: Vec<[f32; 2]> = blobs.iter().map(|b| b.centroid).collect();
    points.sort_by(|a, b| {
        a[0].partial_cmp(&b[0])
            .unwrap_or(Ordering::Equal)
            .then(a[1].partial_cmp(&b[1]).unwrap_or(Ordering::Equal))
    });

    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let p = points[i];
        let mut best_sq = f32::INFINITY;
        for q in points[i + 1..].iter() {
            let dx = q[0] - p[0];
            if dx * dx > best_sq {
                break;
            }
            best_sq = best_sq.min(dx * dx + (q[1] - p[1]).powi(2));
        }
        for q in points[..i].iter().rev() {
            let dx = p[0] - q[0];
            if dx * dx > best_sq {
                break;
            }
            best_sq = best_sq.min(dx * dx + (q[1] - p[1]).powi(2));
        }
        if best_sq.is_finite() {
            out.push(best_sq.sqrt());
        }
    }
    out
}
