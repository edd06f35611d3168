use crate::algorithms::clamp_unit;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Which score a threshold table reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// The integrated final score.
    #[default]
    Final,
    /// The math ensemble's overall score.
    Math,
    /// The AI ensemble's overall score.
    Ai,
}

/// One `[lower_bound, next_higher_bound)` interval and its label.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Bracket {
    pub lower_bound: f32,
    pub label: String,
}

impl Bracket {
    pub fn new(lower_bound: f32, label: impl Into<String>) -> Self {
        Self {
            lower_bound,
            label: label.into(),
        }
    }
}

/// Ordered cutoff table mapping a score in `[0, 1]` to a label.
///
/// Brackets are sorted by strictly decreasing `lower_bound` and the last
/// bound is exactly `0`, so the half-open intervals tile `[0, 1]` with no
/// gaps and no overlap.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ThresholdTable {
    pub name: String,
    #[serde(default)]
    pub source: ScoreSource,
    pub brackets: Vec<Bracket>,
}

impl ThresholdTable {
    /// Build and validate a table from `(lower_bound, label)` pairs.
    pub fn new(
        name: impl Into<String>,
        brackets: impl IntoIterator<Item = (f32, &'static str)>,
    ) -> Result<Self, ConfigError> {
        let table = Self {
            name: name.into(),
            source: ScoreSource::Final,
            brackets: brackets
                .into_iter()
                .map(|(bound, label)| Bracket::new(bound, label))
                .collect(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn with_source(mut self, source: ScoreSource) -> Self {
        self.source = source;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| ConfigError::InvalidThresholdTable {
            table: self.name.clone(),
            reason,
        };
        let Some(last) = self.brackets.last() else {
            return Err(fail("no brackets".into()));
        };
        for b in &self.brackets {
            if !b.lower_bound.is_finite() || !(0.0..=1.0).contains(&b.lower_bound) {
                return Err(fail(format!(
                    "bound {} of `{}` is outside [0, 1]",
                    b.lower_bound, b.label
                )));
            }
            if b.label.trim().is_empty() {
                return Err(fail(format!("bound {} has an empty label", b.lower_bound)));
            }
        }
        for pair in self.brackets.windows(2) {
            if pair[1].lower_bound >= pair[0].lower_bound {
                return Err(fail(format!(
                    "bounds must be strictly decreasing ({} then {})",
                    pair[0].lower_bound, pair[1].lower_bound
                )));
            }
        }
        if last.lower_bound != 0.0 {
            return Err(fail(format!(
                "lowest bound is {}, expected 0",
                last.lower_bound
            )));
        }
        Ok(())
    }

    /// Index of the first bracket whose bound `score` meets or exceeds.
    pub fn bracket_index(&self, score: f32) -> usize {
        let score = clamp_unit(score);
        self.brackets
            .iter()
            .position(|b| score >= b.lower_bound)
            .unwrap_or(self.brackets.len().saturating_sub(1))
    }

    /// Label for `score`. Out-of-range scores are clamped to `[0, 1]`.
    pub fn classify(&self, score: f32) -> &str {
        self.brackets
            .get(self.bracket_index(score))
            .map(|b| b.label.as_str())
            .unwrap_or_default()
    }

    /// Label of the lowest bracket.
    pub fn lowest_label(&self) -> &str {
        self.brackets
            .last()
            .map(|b| b.label.as_str())
            .unwrap_or_default()
    }
}
