use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ScoreBreakdown;

const SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each sub-score in the overall match score.
///
/// Loaded once at startup and handed to the calculator by value; validation
/// rejects anything that does not already sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatchWeights {
    pub skill_overlap: f64,
    pub career_fit: f64,
    pub culture_fit: f64,
    pub learning_opportunities: f64,
    pub motivation_alignment: f64,
    pub experience_level: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skill_overlap: 0.30,
            career_fit: 0.25,
            culture_fit: 0.15,
            learning_opportunities: 0.15,
            motivation_alignment: 0.10,
            experience_level: 0.05,
        }
    }
}

impl MatchWeights {
    /// Parses a JSON weights object, e.g. from the `MATCH_WEIGHTS` variable.
    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let weights: MatchWeights = serde_json::from_str(raw)
            .map_err(|e| AppError::Configuration(format!("MATCH_WEIGHTS is not valid: {e}")))?;
        weights.validate()
    }

    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("skill_overlap", self.skill_overlap),
            ("career_fit", self.career_fit),
            ("culture_fit", self.culture_fit),
            ("learning_opportunities", self.learning_opportunities),
            ("motivation_alignment", self.motivation_alignment),
            ("experience_level", self.experience_level),
        ]
    }

    pub fn sum(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    /// Never normalises: a bad configuration is fatal.
    pub fn validate(self) -> Result<Self, AppError> {
        for (name, weight) in self.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AppError::Configuration(format!(
                    "weight '{name}' must be a finite non-negative number, got {weight}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(AppError::Configuration(format!(
                "match weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(self)
    }

    /// Σ(sub-score × weight), clamped to [0, 1].
    pub fn combine(&self, breakdown: &ScoreBreakdown) -> f64 {
        (breakdown.skill_overlap * self.skill_overlap
            + breakdown.career_fit * self.career_fit
            + breakdown.culture_fit * self.culture_fit
            + breakdown.learning_opportunities * self.learning_opportunities
            + breakdown.motivation_alignment * self.motivation_alignment
            + breakdown.experience_level * self.experience_level)
            .clamp(0.0, 1.0)
    }
}
