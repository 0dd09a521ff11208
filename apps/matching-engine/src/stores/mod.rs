//! Read-only store contracts consumed by the matching core.
//!
//! Each backing system (relational, graph, vector) sits behind a narrow trait
//! so the calculator can be wired against live clients in `main` and against
//! `memory` fakes in tests. "Not found" is modelled as `None` or an empty
//! result, never as an error.

pub mod cached_profile;
#[cfg(test)]
pub mod memory;
pub mod neo4j;
pub mod postgres;
pub mod qdrant;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{CandidateCareerProfile, CultureMatch, JobOpportunity};

#[async_trait]
pub trait CareerProfileStore: Send + Sync {
    async fn fetch_profile(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateCareerProfile>, AppError>;
}

#[async_trait]
pub trait JobOpportunityStore: Send + Sync {
    async fn fetch_job(&self, job_id: i64) -> Result<Option<JobOpportunity>, AppError>;

    /// Ids of every job in the `active` lifecycle state, ascending.
    async fn active_job_ids(&self) -> Result<Vec<i64>, AppError>;

    /// Active job ids the candidate has not swiped on yet, ascending, at most `cap`.
    async fn unswiped_active_job_ids(
        &self,
        candidate_id: i64,
        cap: usize,
    ) -> Result<Vec<i64>, AppError>;
}

#[async_trait]
pub trait TrajectoryGraphIndex: Send + Sync {
    /// Typical next-role title fragments for a trajectory. Unknown keys yield
    /// an empty list.
    async fn typical_roles(&self, trajectory_key: &str) -> Result<Vec<String>, AppError>;
}

#[async_trait]
pub trait CultureSimilarityIndex: Send + Sync {
    /// Up to `k` nearest work cultures, highest score first.
    async fn nearest_cultures(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<CultureMatch>, AppError>;
}
