//! In-memory implementations of the store contracts for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embedding::TextEmbedder;
use crate::errors::AppError;
use crate::models::{CandidateCareerProfile, CultureMatch, JobOpportunity};
use crate::stores::{
    CareerProfileStore, CultureSimilarityIndex, JobOpportunityStore, TrajectoryGraphIndex,
};

pub fn sample_profile(candidate_id: i64) -> CandidateCareerProfile {
    CandidateCareerProfile {
        candidate_id,
        motivations: vec!["Technical challenges".to_string()],
        career_trajectory: "individual_contributor".to_string(),
        five_year_goals: vec!["Staff Engineer".to_string()],
        skills_to_develop: vec!["Rust".to_string(), "Go".to_string()],
        ideal_work_environment: "Remote-first, small team, high autonomy".to_string(),
        years_experience: 5,
        current_title: "Software Engineer".to_string(),
        skills: vec!["Python".to_string(), "PostgreSQL".to_string()],
        ..CandidateCareerProfile::default()
    }
}

pub fn sample_job(id: i64) -> JobOpportunity {
    JobOpportunity {
        id,
        title: "Backend Engineer".to_string(),
        description: "Build distributed systems at scale".to_string(),
        required_skills: vec!["Python".to_string()],
        nice_to_have_skills: vec!["Rust".to_string()],
        min_experience: 3,
        max_experience: 8,
        company_name: format!("Company {id}"),
        company_description: "A small product company".to_string(),
        ..JobOpportunity::default()
    }
}

pub struct InMemoryProfileStore {
    profiles: HashMap<i64, CandidateCareerProfile>,
    reads: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new(profiles: Vec<CandidateCareerProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.candidate_id, p)).collect(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CareerProfileStore for InMemoryProfileStore {
    async fn fetch_profile(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateCareerProfile>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.profiles.get(&candidate_id).cloned())
    }
}

/// Jobs keyed by id. `active` may list ids that have no job row, which is how
/// tests simulate a job vanishing between enumeration and scoring. Reads of
/// ids in `failing` return a database error.
pub struct InMemoryJobStore {
    jobs: BTreeMap<i64, JobOpportunity>,
    active: Vec<i64>,
    swiped: HashSet<(i64, i64)>,
    failing: HashSet<i64>,
    reads: AtomicUsize,
}

impl InMemoryJobStore {
    pub fn new(jobs: Vec<JobOpportunity>) -> Self {
        let active = jobs.iter().map(|j| j.id).collect();
        Self::with_active(jobs, active)
    }

    pub fn with_active(jobs: Vec<JobOpportunity>, mut active: Vec<i64>) -> Self {
        active.sort_unstable();
        Self {
            jobs: jobs.into_iter().map(|j| (j.id, j)).collect(),
            active,
            swiped: HashSet::new(),
            failing: HashSet::new(),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn swipe(mut self, candidate_id: i64, job_id: i64) -> Self {
        self.swiped.insert((candidate_id, job_id));
        self
    }

    pub fn fail_reads_of(mut self, job_id: i64) -> Self {
        self.failing.insert(job_id);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobOpportunityStore for InMemoryJobStore {
    async fn fetch_job(&self, job_id: i64) -> Result<Option<JobOpportunity>, AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&job_id) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.jobs.get(&job_id).cloned())
    }

    async fn active_job_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(self.active.clone())
    }

    async fn unswiped_active_job_ids(
        &self,
        candidate_id: i64,
        cap: usize,
    ) -> Result<Vec<i64>, AppError> {
        Ok(self
            .active
            .iter()
            .copied()
            .filter(|id| !self.swiped.contains(&(candidate_id, *id)))
            .take(cap)
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryTrajectoryIndex {
    roles: HashMap<String, Vec<String>>,
    failing: bool,
}

impl InMemoryTrajectoryIndex {
    pub fn new(entries: Vec<(&str, Vec<&str>)>) -> Self {
        Self {
            roles: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into_iter().map(str::to_string).collect()))
                .collect(),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            roles: HashMap::new(),
            failing: true,
        }
    }
}

#[async_trait]
impl TrajectoryGraphIndex for InMemoryTrajectoryIndex {
    async fn typical_roles(&self, trajectory_key: &str) -> Result<Vec<String>, AppError> {
        if self.failing {
            return Err(AppError::Graph("graph store unreachable".to_string()));
        }
        Ok(self.roles.get(trajectory_key).cloned().unwrap_or_default())
    }
}

pub struct InMemoryCultureIndex {
    hits: Vec<CultureMatch>,
    failing: bool,
    queries: AtomicUsize,
}

impl InMemoryCultureIndex {
    pub fn new(hits: Vec<CultureMatch>) -> Self {
        Self {
            hits,
            failing: false,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            hits: Vec::new(),
            failing: true,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CultureSimilarityIndex for InMemoryCultureIndex {
    async fn nearest_cultures(
        &self,
        _vector: &[f32],
        k: usize,
    ) -> Result<Vec<CultureMatch>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Vector("vector store unreachable".to_string()));
        }
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

pub fn culture_hit(culture_type: &str, score: f32) -> CultureMatch {
    CultureMatch {
        culture_id: "4".to_string(),
        score,
        culture_type: culture_type.to_string(),
        description: String::new(),
        characteristics: vec![],
    }
}

/// Embeds every text to a constant vector, or always fails.
pub struct StaticEmbedder {
    failing: bool,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self { failing: false }
    }

    pub fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl TextEmbedder for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        if self.failing {
            return Err(AppError::Embedding("embedding API unreachable".to_string()));
        }
        Ok(vec![0.1; 768])
    }
}
