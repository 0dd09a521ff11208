//! MatchScoreCalculator scores one (candidate, job) pair.
//!
//! Flow: fetch profile + job → resolve store-backed signals (trajectory
//! roles, culture hits, skill overlap) concurrently → compute the pure
//! signals → weight, clamp, tier.
//!
//! Only a missing profile or job (or a failing relational read) aborts a
//! score. Graph, vector and embedding failures degrade the affected
//! sub-score to the neutral value with an explanatory reason.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{CacheCategory, CacheKey, ResultCache};
use crate::embedding::TextEmbedder;
use crate::errors::AppError;
use crate::matching::signals::{
    self, Signal, SkillOverlapSignal, CULTURE_NO_PREFERENCE, CULTURE_UNAVAILABLE,
    TRAJECTORY_UNAVAILABLE,
};
use crate::matching::vocabulary::KeywordTable;
use crate::matching::weights::MatchWeights;
use crate::models::{
    CandidateCareerProfile, JobOpportunity, MatchReasons, MatchScore, RecommendationTier,
    ScoreBreakdown, TrajectoryPattern,
};
use crate::stores::{
    CareerProfileStore, CultureSimilarityIndex, JobOpportunityStore, TrajectoryGraphIndex,
};

/// Nearest cultures fetched per lookup; only the top one is scored.
const CULTURE_TOP_K: usize = 3;

/// The data sources a calculator reads from.
#[derive(Clone)]
pub struct MatchSources {
    pub profiles: Arc<dyn CareerProfileStore>,
    pub jobs: Arc<dyn JobOpportunityStore>,
    pub trajectories: Arc<dyn TrajectoryGraphIndex>,
    pub cultures: Arc<dyn CultureSimilarityIndex>,
    pub embedder: Arc<dyn TextEmbedder>,
    pub skills: Arc<dyn SkillOverlapSignal>,
}

/// Culture fit depends only on the candidate, so it is cached per candidate
/// together with the text it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedCultureFit {
    ideal_work_environment: String,
    signal: Signal,
}

pub struct MatchScoreCalculator {
    sources: MatchSources,
    weights: MatchWeights,
    keywords: KeywordTable,
    cache: Option<ResultCache>,
}

impl MatchScoreCalculator {
    /// Fails with `AppError::Configuration` if the weights do not validate.
    pub fn new(sources: MatchSources, weights: MatchWeights) -> Result<Self, AppError> {
        Ok(Self {
            sources,
            weights: weights.validate()?,
            keywords: KeywordTable::default(),
            cache: None,
        })
    }

    /// Enables per-candidate caching of the culture and trajectory signals.
    pub fn with_cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn jobs(&self) -> &Arc<dyn JobOpportunityStore> {
        &self.sources.jobs
    }

    pub fn profiles(&self) -> &Arc<dyn CareerProfileStore> {
        &self.sources.profiles
    }

    /// Scores the pair, or returns `AppError::NotFound` if either side is absent.
    pub async fn score(&self, candidate_id: i64, job_id: i64) -> Result<MatchScore, AppError> {
        let (profile, job) = tokio::try_join!(
            self.sources.profiles.fetch_profile(candidate_id),
            self.sources.jobs.fetch_job(job_id),
        )?;
        let profile = profile
            .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
        let job = job.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

        Ok(self.score_pair(&profile, &job).await)
    }

    /// Scores already-loaded snapshots. Never fails: unavailable signals are
    /// replaced by the neutral value.
    pub async fn score_pair(
        &self,
        profile: &CandidateCareerProfile,
        job: &JobOpportunity,
    ) -> MatchScore {
        let (skill, career, culture) = tokio::join!(
            self.skill_signal(profile, job),
            self.career_signal(profile, job),
            self.culture_signal(profile),
        );
        let learning = signals::learning_opportunities(profile, job);
        let motivation = signals::motivation_alignment(profile, job, &self.keywords);
        let experience = signals::experience_level(profile, job);

        let breakdown = ScoreBreakdown {
            skill_overlap: skill.score,
            career_fit: career.score,
            culture_fit: culture.score,
            learning_opportunities: learning.score,
            motivation_alignment: motivation.score,
            experience_level: experience.score,
        };
        let overall_score = self.weights.combine(&breakdown);
        let recommendation = RecommendationTier::from_score(overall_score);

        debug!(
            "Scored candidate {} against job {}: {:.3} ({})",
            profile.candidate_id,
            job.id,
            overall_score,
            recommendation.as_str()
        );

        MatchScore {
            candidate_id: profile.candidate_id,
            job_id: job.id,
            job_title: job.title.clone(),
            company_name: job.company_name.clone(),
            overall_score,
            breakdown,
            reasons: MatchReasons {
                skill_overlap: skill.reason,
                career_fit: career.reason,
                culture_fit: culture.reason,
                learning_opportunities: learning.reason,
                motivation_alignment: motivation.reason,
                experience_level: experience.reason,
            },
            recommendation,
        }
    }

    async fn skill_signal(&self, profile: &CandidateCareerProfile, job: &JobOpportunity) -> Signal {
        match self.sources.skills.skill_overlap(profile, job).await {
            Ok(signal) => Signal {
                score: signal.score.clamp(0.0, 1.0),
                reason: signal.reason,
            },
            Err(e) => {
                warn!(
                    "Skill overlap unavailable for candidate {} / job {}: {e}",
                    profile.candidate_id, job.id
                );
                Signal::neutral("Skill matching unavailable")
            }
        }
    }

    async fn career_signal(&self, profile: &CandidateCareerProfile, job: &JobOpportunity) -> Signal {
        match self.typical_roles(profile).await {
            Ok(roles) => signals::career_fit(profile, job, &roles),
            Err(e) => {
                warn!(
                    "Trajectory lookup failed for candidate {}: {e}",
                    profile.candidate_id
                );
                Signal::neutral(TRAJECTORY_UNAVAILABLE)
            }
        }
    }

    async fn typical_roles(&self, profile: &CandidateCareerProfile) -> Result<Vec<String>, AppError> {
        let trajectory = profile.career_trajectory.trim();
        if trajectory.is_empty() {
            return Ok(Vec::new());
        }

        let key = CacheKey::candidate(CacheCategory::Trajectory, profile.candidate_id);
        if let Some(cache) = &self.cache {
            if let Some(pattern) = cache.get::<TrajectoryPattern>(&key).await {
                if pattern.key == trajectory {
                    return Ok(pattern.typical_roles);
                }
            }
        }

        let typical_roles = self.sources.trajectories.typical_roles(trajectory).await?;
        if let Some(cache) = &self.cache {
            let pattern = TrajectoryPattern {
                key: trajectory.to_string(),
                typical_roles: typical_roles.clone(),
            };
            cache.put_quietly(&key, &pattern).await;
        }
        Ok(typical_roles)
    }

    async fn culture_signal(&self, profile: &CandidateCareerProfile) -> Signal {
        let ideal = profile.ideal_work_environment.trim();
        if ideal.is_empty() {
            return Signal::neutral(CULTURE_NO_PREFERENCE);
        }

        let key = CacheKey::candidate(CacheCategory::CultureFit, profile.candidate_id);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<CachedCultureFit>(&key).await {
                if cached.ideal_work_environment == ideal {
                    return cached.signal;
                }
            }
        }

        let hits = match self.sources.embedder.embed(ideal).await {
            Ok(vector) => {
                self.sources
                    .cultures
                    .nearest_cultures(&vector, CULTURE_TOP_K)
                    .await
            }
            Err(e) => Err(e),
        };

        match hits {
            Ok(hits) if !hits.is_empty() => {
                let signal = signals::culture_fit_from_hits(&hits);
                if let Some(cache) = &self.cache {
                    let entry = CachedCultureFit {
                        ideal_work_environment: ideal.to_string(),
                        signal: signal.clone(),
                    };
                    cache.put_quietly(&key, &entry).await;
                }
                signal
            }
            Ok(_) => {
                debug!(
                    "No work culture matched for candidate {}",
                    profile.candidate_id
                );
                Signal::neutral(CULTURE_UNAVAILABLE)
            }
            Err(e) => {
                warn!(
                    "Culture fit unavailable for candidate {}: {e}",
                    profile.candidate_id
                );
                Signal::neutral(CULTURE_UNAVAILABLE)
            }
        }
    }
}
