use crate::algorithms::{clamp_unit, AlgorithmOutcome, AlgorithmResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an ensemble's confidence is derived from its members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidencePolicy {
    /// Arithmetic mean of every member's confidence.
    #[default]
    Mean,
    /// Minimum confidence of the two highest-weighted members. Ties in
    /// weight are broken by declaration order.
    Conservative,
}

/// Combined output of one ensemble stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnsembleResult {
    pub overall_score: f32,
    pub confidence: f32,
    pub breakdown: BTreeMap<String, AlgorithmResult>,
}

/// Weighted average of algorithm scores.
///
/// `overall_score = Σ(score_i · weight_i) / Σ(weight_i)` using the actual
/// weight sum, so a table whose weights add up to 95 or 105 still yields a
/// convex combination. Sums are accumulated in declaration order in f64,
/// which keeps the result bit-reproducible.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedEnsembleAggregator {
    policy: ConfidencePolicy,
}

impl WeightedEnsembleAggregator {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ConfidencePolicy {
        self.policy
    }

    pub fn aggregate(&self, outcomes: &[AlgorithmOutcome]) -> EnsembleResult {
        let breakdown: BTreeMap<String, AlgorithmResult> = outcomes
            .iter()
            .map(|o| (o.name.clone(), o.result.clone()))
            .collect();

        let mut weighted = 0.0f64;
        let mut total_weight = 0.0f64;
        for o in outcomes {
            let w = o.weight.max(0.0) as f64;
            weighted += clamp_unit(o.result.score) as f64 * w;
            total_weight += w;
        }
        let overall_score = if total_weight > 0.0 {
            clamp_unit((weighted / total_weight) as f32)
        } else {
            0.0
        };

        EnsembleResult {
            overall_score,
            confidence: clamp_unit(self.confidence(outcomes)),
            breakdown,
        }
    }

    fn confidence(&self, outcomes: &[AlgorithmOutcome]) -> f32 {
        if outcomes.is_empty() {
            return 0.0;
        }
        match self.policy {
            ConfidencePolicy::Mean => {
                let sum: f64 = outcomes
                    .iter()
                    .map(|o| clamp_unit(o.result.confidence) as f64)
                    .sum();
                (sum / outcomes.len() as f64) as f32
            }
            ConfidencePolicy::Conservative => {
                let mut order: Vec<usize> = (0..outcomes.len()).collect();
                // Stable sort keeps declaration order among equal weights.
                order.sort_by(|&a, &b| outcomes[b].weight.total_cmp(&outcomes[a].weight));
                order
                    .iter()
                    .take(2)
                    .map(|&i| clamp_unit(outcomes[i].result.confidence))
                    .fold(f32::INFINITY, f32::min)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, weight: f32, score: f32, confidence: f32) -> AlgorithmOutcome {
        AlgorithmOutcome {
            name: name.to_string(),
            weight,
            result: AlgorithmResult::new(score, confidence),
        }
    }

    #[test]
    fn weighted_mean_of_scores() {
        let agg = WeightedEnsembleAggregator::default();
        let res = agg.aggregate(&[
            outcome("a", 60.0, 1.0, 0.9),
            outcome("b", 40.0, 0.0, 0.5),
        ]);
        assert!((res.overall_score - 0.6).abs() < 1e-6);
        assert!((res.confidence - 0.7).abs() < 1e-6);
        assert_eq!(res.breakdown.len(), 2);
    }

    #[test]
    fn normalises_by_actual_weight_sum() {
        let agg = WeightedEnsembleAggregator::default();
        for total in [95.0f32, 105.0] {
            let a = total * 0.5;
            let res = agg.aggregate(&[outcome("a", a, 0.8, 0.5), outcome("b", total - a, 0.8, 0.5)]);
            assert!((res.overall_score - 0.8).abs() < 1e-6, "total={total}");

            let mixed = agg.aggregate(&[outcome("a", a, 1.0, 0.5), outcome("b", total - a, 0.2, 0.5)]);
            assert!((0.2..=1.0).contains(&mixed.overall_score));
            assert!((mixed.overall_score - 0.6).abs() < 1e-6, "total={total}");
        }
    }

    #[test]
    fn conservative_uses_two_heaviest() {
        let agg = WeightedEnsembleAggregator::new(ConfidencePolicy::Conservative);
        let res = agg.aggregate(&[
            outcome("light", 10.0, 0.5, 0.05),
            outcome("heavy", 50.0, 0.5, 0.9),
            outcome("mid", 40.0, 0.5, 0.6),
        ]);
        assert!((res.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn conservative_breaks_ties_by_declaration_order() {
        let agg = WeightedEnsembleAggregator::new(ConfidencePolicy::Conservative);
        let res = agg.aggregate(&[
            outcome("first", 30.0, 0.5, 0.8),
            outcome("second", 30.0, 0.5, 0.7),
            outcome("third", 30.0, 0.5, 0.1),
        ]);
        assert!((res.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn single_member_conservative_uses_its_confidence() {
        let agg = WeightedEnsembleAggregator::new(ConfidencePolicy::Conservative);
        let res = agg.aggregate(&[outcome("only", 100.0, 0.3, 0.42)]);
        assert!((res.confidence - 0.42).abs() < 1e-6);
    }

    #[test]
    fn empty_input_yields_zero() {
        let res = WeightedEnsembleAggregator::default().aggregate(&[]);
        assert_eq!(res.overall_score, 0.0);
        assert_eq!(res.confidence, 0.0);
        assert!(res.breakdown.is_empty());
    }

    #[test]
    fn policy_deserialises_from_snake_case() {
        let p: ConfidencePolicy = serde_json::from_str("\"conservative\"").expect("parse");
        assert_eq!(p, ConfidencePolicy::Conservative);
    }
}
