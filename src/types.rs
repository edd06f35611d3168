use crate::ensemble::EnsembleResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Final output of one analysis.
///
/// Both ensemble breakdowns are kept for audit; every map is ordered so the
/// serialised form is byte-identical across runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticResult {
    pub final_score: f32,
    pub confidence: f32,
    pub category: String,
    pub secondary_labels: BTreeMap<String, String>,
    pub math: EnsembleResult,
    pub ai: EnsembleResult,
}

impl DiagnosticResult {
    /// Names of algorithms, across both stages, that reported insufficient data.
    pub fn degraded_algorithms(&self) -> Vec<&str> {
        self.math
            .breakdown
            .iter()
            .chain(self.ai.breakdown.iter())
            .filter(|(_, r)| r.is_degraded())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
