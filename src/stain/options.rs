use crate::error::ConfigError;
use nalgebra::{Matrix3, RowVector3};
use serde::{Deserialize, Serialize};

/// Ruifrok & Johnston hematoxylin OD vector.
pub const HEMATOXYLIN_VECTOR: [f32; 3] = [0.650, 0.704, 0.286];
/// Ruifrok & Johnston eosin OD vector.
pub const EOSIN_VECTOR: [f32; 3] = [0.072, 0.990, 0.105];
/// Third basis vector collecting whatever the two stains do not explain.
pub const RESIDUAL_VECTOR: [f32; 3] = [0.268, 0.570, 0.776];
/// Added to the transmittance so that black pixels map to a finite OD.
pub const DEFAULT_OD_EPSILON: f32 = 1e-6;

/// Stain basis and OD conversion constants.
///
/// These are fixed approximations, not per-slide calibrations.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StainOptions {
    pub hematoxylin: [f32; 3],
    pub eosin: [f32; 3],
    pub residual: [f32; 3],
    pub od_epsilon: f32,
}

impl Default for StainOptions {
    fn default() -> Self {
        Self {
            hematoxylin: HEMATOXYLIN_VECTOR,
            eosin: EOSIN_VECTOR,
            residual: RESIDUAL_VECTOR,
            od_epsilon: DEFAULT_OD_EPSILON,
        }
    }
}

impl StainOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, vector) in [
            ("hematoxylin", self.hematoxylin),
            ("eosin", self.eosin),
            ("residual", self.residual),
        ] {
            let finite = vector.iter().all(|c| c.is_finite());
            let norm_sq: f32 = vector.iter().map(|c| c * c).sum();
            if !finite || norm_sq <= f32::EPSILON {
                return Err(ConfigError::InvalidStainVector { name, vector });
            }
        }
        if !self.od_epsilon.is_finite() || self.od_epsilon <= 0.0 {
            return Err(ConfigError::InvalidOdEpsilon(self.od_epsilon));
        }
        Ok(())
    }

    /// Projection matrix whose rows are the stain vectors.
    pub fn matrix(&self) -> Matrix3<f32> {
        Matrix3::from_rows(&[
            RowVector3::from(self.hematoxylin),
            RowVector3::from(self.eosin),
            RowVector3::from(self.residual),
        ])
    }
}
