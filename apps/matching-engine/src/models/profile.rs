use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Immutable snapshot of a candidate's career context, as read from
/// `candidate_profiles`. Array columns are coalesced to empty lists and
/// free text to the empty string by the reading query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CandidateCareerProfile {
    pub candidate_id: i64,
    pub past_motivations: Vec<String>,
    pub proudest_achievements: Vec<String>,
    pub current_interests: Vec<String>,
    pub ideal_work_environment: String,
    pub learning_priorities: Vec<String>,
    pub deal_breakers: Vec<String>,
    pub motivations: Vec<String>,
    pub career_trajectory: String,
    pub five_year_goals: Vec<String>,
    pub dream_companies: Vec<String>,
    pub skills_to_develop: Vec<String>,
    pub long_term_vision: String,
    pub years_experience: i32,
    pub current_title: String,
    /// Demonstrated skill names from `candidate_skills`.
    pub skills: Vec<String>,
}
