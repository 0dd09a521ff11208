use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Immutable snapshot of a job joined with its company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobOpportunity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    pub min_experience: i32,
    pub max_experience: i32,
    pub min_salary: Option<i32>,
    pub max_salary: Option<i32>,
    pub company_name: String,
    pub company_description: String,
}
