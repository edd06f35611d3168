//! Channel preprocessing: denoise, level scaling, contrast enhancement.
//!
//! Applied independently to each stain channel, in place:
//! 1. 3×3 mean filter over the raw optical densities (see [`filters`]).
//! 2. Mapping of OD onto 0..=255 levels, `clamp(v / od_range, 0, 1) * 255`.
//! 3. Histogram equalisation over 256 quantised levels (see [`histogram`]).
//!
//! Equalisation stretches any occupied range to the full 0..=255 scale, so
//! the level span seen before step 3 is recorded on [`StainChannels`] for
//! extractors that need to tell real contrast from amplified noise.
//!
//! A single scratch buffer is shared by the three channels, so peak memory is
//! four channel-sized buffers regardless of how many steps are enabled.

pub mod filters;
pub mod histogram;

pub use filters::box_mean_3x3_in_place;
pub use histogram::{equalize_in_place, LevelHistogram};

use crate::error::ConfigError;
use crate::image::ImageF32;
use crate::stain::{StainChannel, StainChannels};
use log::debug;
use serde::{Deserialize, Serialize};

/// Default OD mapped to level 255.
pub const DEFAULT_OD_RANGE: f32 = 3.0;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PreprocessOptions {
    /// Apply the 3×3 mean filter.
    pub denoise: bool,
    /// Optical density mapped to level 255; larger values saturate.
    pub od_range: f32,
    /// Apply per-channel histogram equalisation.
    pub equalize: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            denoise: true,
            od_range: DEFAULT_OD_RANGE,
            equalize: true,
        }
    }
}

impl PreprocessOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.od_range.is_finite() || self.od_range <= 0.0 {
            return Err(ConfigError::InvalidOdRange(self.od_range));
        }
        Ok(())
    }
}

/// Denoises and contrast-normalises stain channels.
#[derive(Clone, Debug)]
pub struct ChannelPreprocessor {
    options: PreprocessOptions,
}

impl ChannelPreprocessor {
    pub fn new(options: PreprocessOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Run every enabled step on all three channels.
    pub fn apply(&self, channels: &mut StainChannels) {
        let mut scratch = ImageF32::new(channels.width(), channels.height());
        for channel in StainChannel::ALL {
            let (span, equalized) = self.apply_channel(channels.get_mut(channel), &mut scratch);
            channels.record_level_span(channel, span);
            debug!(
                "preprocess: channel={} level_span={} equalized={}",
                channel.name(),
                span,
                equalized
            );
        }
    }

    /// Returns the pre-equalisation level span and whether equalisation
    /// remapped the channel.
    fn apply_channel(&self, channel: &mut ImageF32, scratch: &mut ImageF32) -> (usize, bool) {
        if self.options.denoise {
            box_mean_3x3_in_place(channel, scratch);
        }
        scale_to_levels(channel, self.options.od_range);
        let span = LevelHistogram::from_channel(channel).occupied_span();
        (span, self.options.equalize && equalize_in_place(channel))
    }
}

/// Map optical densities in `[0, od_range]` onto levels `[0, 255]`.
pub fn scale_to_levels(channel: &mut ImageF32, od_range: f32) {
    let max_level = (histogram::LEVELS - 1) as f32;
    for v in channel.data.iter_mut() {
        let normalized = (*v / od_range).clamp(0.0, 1.0);
        *v = if normalized.is_nan() {
            0.0
        } else {
            normalized * max_level
        };
    }
}
