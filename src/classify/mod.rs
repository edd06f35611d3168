//! Threshold classification of continuous scores.
//!
//! A single mechanism, the [`ThresholdTable`], serves the diagnostic
//! category as well as every secondary label (grade, stage, subtype, ...).
//! Tables are configuration data; nothing here is specific to one domain.

mod table;

pub use table::{Bracket, ScoreSource, ThresholdTable};

use crate::error::ConfigError;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Scores available to threshold tables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageScores {
    pub final_score: f32,
    pub math: f32,
    pub ai: f32,
}

impl StageScores {
    pub fn get(&self, source: ScoreSource) -> f32 {
        match source {
            ScoreSource::Final => self.final_score,
            ScoreSource::Math => self.math,
            ScoreSource::Ai => self.ai,
        }
    }
}

/// Labels produced by a [`ThresholdClassifier`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Classification {
    pub category: String,
    pub secondary_labels: BTreeMap<String, String>,
}

/// The category table plus any number of secondary tables.
#[derive(Clone, Debug)]
pub struct ThresholdClassifier {
    category: ThresholdTable,
    secondary: Vec<ThresholdTable>,
}

impl ThresholdClassifier {
    pub fn new(
        category: ThresholdTable,
        secondary: Vec<ThresholdTable>,
    ) -> Result<Self, ConfigError> {
        category.validate()?;
        let mut names = BTreeSet::new();
        for table in &secondary {
            table.validate()?;
            if !names.insert(table.name.as_str()) {
                return Err(ConfigError::DuplicateTable {
                    table: table.name.clone(),
                });
            }
        }
        Ok(Self {
            category,
            secondary,
        })
    }

    pub fn category_table(&self) -> &ThresholdTable {
        &self.category
    }

    pub fn secondary_tables(&self) -> &[ThresholdTable] {
        &self.secondary
    }

    pub fn classify(&self, scores: &StageScores) -> Classification {
        let category = self
            .category
            .classify(scores.get(self.category.source))
            .to_string();
        let secondary_labels = self
            .secondary
            .iter()
            .map(|t| (t.name.clone(), t.classify(scores.get(t.source)).to_string()))
            .collect();
        Classification {
            category,
            secondary_labels,
        }
    }
}
