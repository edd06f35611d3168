use super::gradient::sobel_magnitude;
use super::support_confidence;
use crate::algorithms::{AlgorithmResult, Extractor};
use crate::image::ImageRgba8;
use crate::stain::{StainChannel, StainChannels};

/// Pre-equalisation level span below which a channel is treated as flat.
pub const MIN_LEVEL_SPAN: usize = 12;

/// Edge density on one stain channel.
///
/// Counts pixels whose Sobel magnitude exceeds `magnitude_threshold`; the
/// score is their share of the image relative to `reference_density`.
///
/// Equalisation stretches even a couple of noise levels to full scale, so a
/// channel whose recorded pre-equalisation span is below `min_level_span`
/// is reported as insufficient before any edge is counted.
#[derive(Clone, Debug)]
pub struct EdgeTexture {
    pub channel: StainChannel,
    pub min_level_span: usize,
    pub min_edge_pixels: usize,
    pub magnitude_threshold: f32,
    pub reference_density: f32,
}

impl EdgeTexture {
    pub fn chromatin() -> Self {
        Self {
            channel: StainChannel::Hematoxylin,
            min_level_span: MIN_LEVEL_SPAN,
            min_edge_pixels: 20,
            magnitude_threshold: 0.25,
            reference_density: 0.3,
        }
    }

    pub fn stromal() -> Self {
        Self {
            channel: StainChannel::Eosin,
            min_level_span: MIN_LEVEL_SPAN,
            min_edge_pixels: 20,
            magnitude_threshold: 0.25,
            reference_density: 0.4,
        }
    }
}

impl Extractor for EdgeTexture {
    fn extract(&self, _image: &ImageRgba8<'_>, channels: &StainChannels) -> AlgorithmResult {
        if let Some(span) = channels.level_span(self.channel) {
            if span < self.min_level_span {
                return AlgorithmResult::insufficient("contrast levels", span, self.min_level_span);
            }
        }
        let mag = sobel_magnitude(channels.get(self.channel));
        let mut edge_pixels = 0usize;
        let mut edge_sum = 0.0f64;
        for &m in &mag.data {
            if m > self.magnitude_threshold {
                edge_pixels += 1;
                edge_sum += m as f64;
            }
        }
        if edge_pixels < self.min_edge_pixels {
            return AlgorithmResult::insufficient("edge pixels", edge_pixels, self.min_edge_pixels);
        }
        let density = edge_pixels as f32 / mag.data.len() as f32;
        let mean_magnitude = edge_sum / edge_pixels as f64;

        AlgorithmResult::new(
            density / self.reference_density,
            support_confidence(edge_pixels, self.min_edge_pixels),
        )
        .with_feature("channel", self.channel.name())
        .with_feature("edge_pixels", edge_pixels)
        .with_feature("edge_density", density)
        .with_feature("mean_magnitude", mean_magnitude)
    }
}
