use serde::{Deserialize, Serialize};

/// Coarse label derived from the overall score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationTier {
    Excellent,
    Strong,
    Moderate,
    Weak,
}

impl RecommendationTier {
    /// Thresholds are inclusive lower bounds checked from the top down.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            RecommendationTier::Excellent
        } else if score >= 0.70 {
            RecommendationTier::Strong
        } else if score >= 0.55 {
            RecommendationTier::Moderate
        } else {
            RecommendationTier::Weak
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationTier::Excellent => "excellent",
            RecommendationTier::Strong => "strong",
            RecommendationTier::Moderate => "moderate",
            RecommendationTier::Weak => "weak",
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            RecommendationTier::Excellent => "Excellent match - Highly recommended",
            RecommendationTier::Strong => "Strong match - Good fit",
            RecommendationTier::Moderate => "Moderate match - Worth considering",
            RecommendationTier::Weak => "Weak match - May not be ideal",
        }
    }
}

/// The six sub-scores, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skill_overlap: f64,
    pub career_fit: f64,
    pub culture_fit: f64,
    pub learning_opportunities: f64,
    pub motivation_alignment: f64,
    pub experience_level: f64,
}

/// Per-factor explanation. `None` means the factor had nothing to explain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReasons {
    pub skill_overlap: Option<String>,
    pub career_fit: Option<String>,
    pub culture_fit: Option<String>,
    pub learning_opportunities: Option<String>,
    pub motivation_alignment: Option<String>,
    pub experience_level: Option<String>,
}

/// The explained result of scoring one (candidate, job) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub candidate_id: i64,
    pub job_id: i64,
    pub job_title: String,
    pub company_name: String,
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
    pub reasons: MatchReasons,
    pub recommendation: RecommendationTier,
}
