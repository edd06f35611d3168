use super::aggregator::EnsembleResult;
use crate::algorithms::clamp_unit;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Tolerance on `math_weight + ai_weight == 1`.
const WEIGHT_SUM_TOLERANCE: f32 = 1e-4;

/// Weights and confidence ceiling of the second integration stage.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegrationOptions {
    pub math_weight: f32,
    pub ai_weight: f32,
    /// Upper bound on the reported confidence, whatever the stages claim.
    pub confidence_ceiling: f32,
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        Self {
            math_weight: 0.75,
            ai_weight: 0.25,
            confidence_ceiling: 0.97,
        }
    }
}

impl IntegrationOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (m, a) = (self.math_weight, self.ai_weight);
        let weights_ok = m.is_finite()
            && a.is_finite()
            && m >= 0.0
            && a >= 0.0
            && ((m + a) - 1.0).abs() <= WEIGHT_SUM_TOLERANCE;
        if !weights_ok {
            return Err(ConfigError::InvalidIntegrationWeights { math: m, ai: a });
        }
        let c = self.confidence_ceiling;
        if !c.is_finite() || c <= 0.0 || c > 1.0 {
            return Err(ConfigError::InvalidConfidenceCeiling(c));
        }
        Ok(())
    }
}

/// Final score and confidence before classification.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct IntegratedScore {
    pub final_score: f32,
    pub confidence: f32,
}

/// Blends the math and AI ensembles.
///
/// `final_score = math · W_math + ai · W_ai` and
/// `confidence = min(min(math.confidence, ai.confidence), ceiling)`.
#[derive(Clone, Debug)]
pub struct TwoStageIntegrator {
    options: IntegrationOptions,
}

impl TwoStageIntegrator {
    pub fn new(options: IntegrationOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &IntegrationOptions {
        &self.options
    }

    pub fn integrate(&self, math: &EnsembleResult, ai: &EnsembleResult) -> IntegratedScore {
        let o = &self.options;
        let final_score = clamp_unit(
            clamp_unit(math.overall_score) * o.math_weight
                + clamp_unit(ai.overall_score) * o.ai_weight,
        );
        let confidence = clamp_unit(math.confidence)
            .min(clamp_unit(ai.confidence))
            .min(o.confidence_ceiling);
        IntegratedScore {
            final_score,
            confidence,
        }
    }
}
