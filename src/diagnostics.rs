//! Deterministic per-stage diagnostics returned by
//! [`DiagnosticPipeline::analyze_with_diagnostics`](crate::DiagnosticPipeline::analyze_with_diagnostics).
use crate::image::ImageF32;
use crate::preprocess::LevelHistogram;
use crate::stain::StainChannel;
use crate::types::DiagnosticResult;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
}

/// Summary of one preprocessed channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChannelStats {
    pub channel: StainChannel,
    pub mean: f32,
    pub std_dev: f32,
    pub min: f32,
    pub max: f32,
    pub distinct_levels: usize,
}

impl ChannelStats {
    pub fn from_channel(channel: StainChannel, image: &ImageF32) -> Self {
        let n = image.data.len().max(1) as f64;
        let mean = image.mean() as f64;
        let var = image
            .data
            .iter()
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let (min, max) = image
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let (min, max) = if image.data.is_empty() {
            (0.0, 0.0)
        } else {
            (min, max)
        };
        Self {
            channel,
            mean: mean as f32,
            std_dev: var.sqrt() as f32,
            min,
            max,
            distinct_levels: LevelHistogram::from_channel(image).distinct_levels(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageDiagnostics {
    pub stage: String,
    pub algorithms: usize,
    pub total_weight: f32,
    pub degraded: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineDiagnostics {
    pub input: InputDescriptor,
    pub channels: Vec<ChannelStats>,
    pub stages: Vec<StageDiagnostics>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetailedResult {
    pub result: DiagnosticResult,
    pub diagnostics: PipelineDiagnostics,
}
