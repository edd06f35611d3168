use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score reported by an extractor that could not find enough structure.
pub const DEGRADED_SCORE: f32 = 0.0;
/// Confidence reported by an extractor that could not find enough structure.
pub const DEGRADED_CONFIDENCE: f32 = 0.1;

/// Clamp to `[0, 1]`, mapping NaN to `0`.
#[inline]
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// A single named measurement attached to an [`AlgorithmResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Count(u64),
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> Self {
        FeatureValue::Count(v as u64)
    }
}

impl From<u64> for FeatureValue {
    fn from(v: u64) -> Self {
        FeatureValue::Count(v)
    }
}

impl From<f32> for FeatureValue {
    fn from(v: f32) -> Self {
        FeatureValue::Number(v as f64)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        FeatureValue::Flag(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Text(v)
    }
}

/// Uniform output of every extractor.
///
/// `error` is set when the extractor ran on well-formed input but found too
/// little structure to measure; the score and confidence are then low but
/// still valid, and the ensemble keeps going.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmResult {
    pub score: f32,
    pub confidence: f32,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AlgorithmResult {
    pub fn new(score: f32, confidence: f32) -> Self {
        Self {
            score: clamp_unit(score),
            confidence: clamp_unit(confidence),
            features: BTreeMap::new(),
            error: None,
        }
    }

    /// Degraded result for a structure count below the declared minimum.
    pub fn insufficient(what: &str, found: usize, required: usize) -> Self {
        Self {
            score: DEGRADED_SCORE,
            confidence: DEGRADED_CONFIDENCE,
            features: BTreeMap::new(),
            error: Some(format!(
                "insufficient {what}: detected {found}, need at least {required}"
            )),
        }
        .with_feature("detected", found)
        .with_feature("required", required)
    }

    /// Degraded result carrying an arbitrary message.
    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            score: DEGRADED_SCORE,
            confidence: DEGRADED_CONFIDENCE,
            features: BTreeMap::new(),
            error: Some(message.into()),
        }
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Force score and confidence back into `[0, 1]`.
    pub fn sanitized(mut self) -> Self {
        self.score = clamp_unit(self.score);
        self.confidence = clamp_unit(self.confidence);
        self
    }
}
