//! Colour deconvolution of RGBA tiles into optical-density stain channels.
//!
//! Each pixel is converted to optical density per RGB channel,
//! `OD_c = -log10(c / 255 + ε)`, and the OD vector is projected onto three
//! fixed stain vectors (hematoxylin, eosin, residual) by dot product. The
//! alpha channel is ignored.
//!
//! OD only depends on the byte value, so a 256-entry lookup table is built
//! per deconvolver and shared by every pixel. Rows are independent and are
//! processed on the rayon pool when the `parallel` feature is enabled; the
//! output does not depend on scheduling.

mod options;

pub use options::{
    StainOptions, DEFAULT_OD_EPSILON, EOSIN_VECTOR, HEMATOXYLIN_VECTOR, RESIDUAL_VECTOR,
};

use crate::error::{ConfigError, InputValidationError};
use crate::image::rgba::RGBA_CHANNELS;
use crate::image::{ImageF32, ImageRgba8};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Identifies one of the three projected channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StainChannel {
    Hematoxylin,
    Eosin,
    Residual,
}

impl StainChannel {
    pub const ALL: [StainChannel; 3] = [
        StainChannel::Hematoxylin,
        StainChannel::Eosin,
        StainChannel::Residual,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StainChannel::Hematoxylin => "hematoxylin",
            StainChannel::Eosin => "eosin",
            StainChannel::Residual => "residual",
        }
    }
}

/// Three parallel per-pixel channels of equal size.
#[derive(Clone, Debug, PartialEq)]
pub struct StainChannels {
    pub hematoxylin: ImageF32,
    pub eosin: ImageF32,
    pub residual: ImageF32,
    /// Occupied level span of each channel before equalisation, in
    /// `StainChannel::ALL` order. `None` until the preprocessor records it.
    level_spans: [Option<usize>; 3],
}

impl StainChannels {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            hematoxylin: ImageF32::new(w, h),
            eosin: ImageF32::new(w, h),
            residual: ImageF32::new(w, h),
            level_spans: [None; 3],
        }
    }

    /// Distance between the lowest and highest occupied level of `channel`
    /// after level scaling and before equalisation.
    pub fn level_span(&self, channel: StainChannel) -> Option<usize> {
        self.level_spans[channel as usize]
    }

    pub fn record_level_span(&mut self, channel: StainChannel, span: usize) {
        self.level_spans[channel as usize] = Some(span);
    }

    pub fn width(&self) -> usize {
        self.hematoxylin.w
    }

    pub fn height(&self) -> usize {
        self.hematoxylin.h
    }

    pub fn get(&self, channel: StainChannel) -> &ImageF32 {
        match channel {
            StainChannel::Hematoxylin => &self.hematoxylin,
            StainChannel::Eosin => &self.eosin,
            StainChannel::Residual => &self.residual,
        }
    }

    pub fn get_mut(&mut self, channel: StainChannel) -> &mut ImageF32 {
        match channel {
            StainChannel::Hematoxylin => &mut self.hematoxylin,
            StainChannel::Eosin => &mut self.eosin,
            StainChannel::Residual => &mut self.residual,
        }
    }
}

/// Projects RGB optical density onto a fixed stain basis.
#[derive(Clone, Debug)]
pub struct StainDeconvolver {
    /// Rows are the hematoxylin, eosin and residual stain vectors.
    matrix: Matrix3<f32>,
    od_lut: [f32; 256],
}

impl StainDeconvolver {
    pub fn new(options: &StainOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self {
            matrix: options.matrix(),
            od_lut: optical_density_lut(options.od_epsilon),
        })
    }

    /// Optical density of a single 8-bit intensity.
    #[inline]
    pub fn optical_density(&self, value: u8) -> f32 {
        self.od_lut[value as usize]
    }

    pub fn matrix(&self) -> &Matrix3<f32> {
        &self.matrix
    }

    /// Validate a raw buffer and deconvolve it.
    pub fn deconvolve_raw(
        &self,
        width: usize,
        height: usize,
        pixels: &[u8],
    ) -> Result<StainChannels, InputValidationError> {
        let image = ImageRgba8::new(width, height, pixels)?;
        Ok(self.deconvolve(image))
    }

    /// Deconvolve an already validated image.
    pub fn deconvolve(&self, image: ImageRgba8<'_>) -> StainChannels {
        let (w, h) = (image.width(), image.height());
        let mut out = StainChannels::new(w, h);
        let src = image.as_bytes();
        let row_bytes = w * RGBA_CHANNELS;

        #[cfg(feature = "parallel")]
        {
            out.hematoxylin
                .data
                .par_chunks_mut(w)
                .zip(out.eosin.data.par_chunks_mut(w))
                .zip(out.residual.data.par_chunks_mut(w))
                .zip(src.par_chunks(row_bytes))
                .for_each(|(((h_row, e_row), r_row), src_row)| {
                    self.deconvolve_row(src_row, h_row, e_row, r_row)
                });
        }
        #[cfg(not(feature = "parallel"))]
        {
            out.hematoxylin
                .data
                .chunks_mut(w)
                .zip(out.eosin.data.chunks_mut(w))
                .zip(out.residual.data.chunks_mut(w))
                .zip(src.chunks(row_bytes))
                .for_each(|(((h_row, e_row), r_row), src_row)| {
                    self.deconvolve_row(src_row, h_row, e_row, r_row)
                });
        }

        out
    }

    fn deconvolve_row(&self, src: &[u8], h_row: &mut [f32], e_row: &mut [f32], r_row: &mut [f32]) {
        for (x, px) in src.chunks_exact(RGBA_CHANNELS).enumerate() {
            let od = Vector3::new(
                self.od_lut[px[0] as usize],
                self.od_lut[px[1] as usize],
                self.od_lut[px[2] as usize],
            );
            let projected = self.matrix * od;
            h_row[x] = projected[0];
            e_row[x] = projected[1];
            r_row[x] = projected[2];
        }
    }
}

fn optical_density_lut(epsilon: f32) -> [f32; 256] {
    let mut lut = [0.0f32; 256];
    for (value, od) in lut.iter_mut().enumerate() {
        let transmittance = value as f32 / 255.0 + epsilon;
        *od = -transmittance.log10();
    }
    lut
}
