use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{CacheCategory, CacheKey, ResultCache};
use crate::errors::AppError;
use crate::matching::ranker::{order_by_score, CandidateMatchRanker, DAILY_LIMIT};
use crate::matching::signals;
use crate::models::{CandidateCareerProfile, JobOpportunity, MatchScore};

/// A ranked list together with the limit it was computed for, so a cached
/// list can serve any request asking for the same number of matches or fewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedMatchList {
    limit: usize,
    matches: Vec<MatchScore>,
}

impl CachedMatchList {
    fn serve(self, limit: usize) -> Option<Vec<MatchScore>> {
        if self.limit < limit {
            return None;
        }
        let mut matches = self.matches;
        matches.truncate(limit);
        Some(matches)
    }
}

/// Which of the job's skills the candidate already has, which are missing,
/// and which missing ones the candidate wants to learn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGapReport {
    pub candidate_id: i64,
    pub job_id: i64,
    pub matched_required: Vec<String>,
    pub missing_required: Vec<String>,
    pub missing_nice_to_have: Vec<String>,
    pub learnable: Vec<String>,
}

impl SkillGapReport {
    fn build(profile: &CandidateCareerProfile, job: &JobOpportunity) -> Self {
        let have: BTreeSet<String> = profile
            .skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();
        let holds = |skill: &String| have.contains(&skill.trim().to_lowercase());

        let (matched_required, missing_required): (Vec<String>, Vec<String>) =
            job.required_skills.iter().cloned().partition(|s| holds(s));
        let missing_nice_to_have = job
            .nice_to_have_skills
            .iter()
            .filter(|&s| !holds(s))
            .cloned()
            .collect();

        Self {
            candidate_id: profile.candidate_id,
            job_id: job.id,
            matched_required,
            missing_required,
            missing_nice_to_have,
            learnable: signals::learnable_skills(profile, job),
        }
    }
}

/// Cache-through front of the matching core.
pub struct MatchingService {
    ranker: Arc<CandidateMatchRanker>,
    cache: ResultCache,
}

impl MatchingService {
    pub fn new(ranker: Arc<CandidateMatchRanker>, cache: ResultCache) -> Self {
        Self { ranker, cache }
    }

    pub async fn score(&self, candidate_id: i64, job_id: i64) -> Result<MatchScore, AppError> {
        let key = CacheKey::pair(CacheCategory::MatchBreakdown, candidate_id, job_id);
        if let Some(score) = self.cache.get::<MatchScore>(&key).await {
            return Ok(score);
        }

        let score = self.ranker.calculator().score(candidate_id, job_id).await?;
        self.cache.put_quietly(&key, &score).await;
        Ok(score)
    }

    pub async fn rank(&self, candidate_id: i64, limit: usize) -> Result<Vec<MatchScore>, AppError> {
        let key = CacheKey::candidate(CacheCategory::Matches, candidate_id);
        if let Some(matches) = self
            .cache
            .get::<CachedMatchList>(&key)
            .await
            .and_then(|cached| cached.serve(limit))
        {
            debug!("Serving {} cached matches for candidate {}", matches.len(), candidate_id);
            return Ok(matches);
        }

        let matches = self.ranker.rank(candidate_id, limit).await?;
        let entry = CachedMatchList {
            limit,
            matches: matches.clone(),
        };
        self.cache.put_quietly(&key, &entry).await;
        self.store_breakdowns(&matches).await;
        Ok(matches)
    }

    /// Top matches among unswiped active jobs. Pairs with a cached breakdown
    /// are not rescored.
    pub async fn rank_daily(&self, candidate_id: i64) -> Result<Vec<MatchScore>, AppError> {
        let job_ids = self.ranker.daily_job_ids(candidate_id).await?;
        let mut matches = self.score_many(candidate_id, &job_ids).await;
        matches.truncate(DAILY_LIMIT);
        Ok(matches)
    }

    /// Scores an explicit job list, reusing cached breakdowns. Unknown jobs
    /// are skipped; duplicates are scored once.
    pub async fn score_batch(&self, candidate_id: i64, job_ids: &[i64]) -> Vec<MatchScore> {
        self.score_many(candidate_id, job_ids).await
    }

    pub async fn skill_gap(&self, candidate_id: i64, job_id: i64) -> Result<SkillGapReport, AppError> {
        let key = CacheKey::pair(CacheCategory::SkillGap, candidate_id, job_id);
        if let Some(report) = self.cache.get::<SkillGapReport>(&key).await {
            return Ok(report);
        }

        let calculator = self.ranker.calculator();
        let (profile, job) = tokio::try_join!(
            calculator.profiles().fetch_profile(candidate_id),
            calculator.jobs().fetch_job(job_id),
        )?;
        let profile = profile
            .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
        let job = job.ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

        let report = SkillGapReport::build(&profile, &job);
        self.cache.put_quietly(&key, &report).await;
        Ok(report)
    }

    /// The top `limit` matches, re-ordered by learning sub-score. Equal
    /// learning scores keep their rank order.
    pub async fn learning_opportunities(
        &self,
        candidate_id: i64,
        limit: usize,
    ) -> Result<Vec<MatchScore>, AppError> {
        let key = CacheKey::candidate(CacheCategory::LearningOpportunities, candidate_id);
        if let Some(matches) = self
            .cache
            .get::<CachedMatchList>(&key)
            .await
            .and_then(|cached| cached.serve(limit))
        {
            return Ok(matches);
        }

        let mut matches = self.rank(candidate_id, limit).await?;
        matches.sort_by(|a, b| {
            b.breakdown
                .learning_opportunities
                .total_cmp(&a.breakdown.learning_opportunities)
        });
        let entry = CachedMatchList {
            limit,
            matches: matches.clone(),
        };
        self.cache.put_quietly(&key, &entry).await;
        Ok(matches)
    }

    pub async fn invalidate_candidate(&self, candidate_id: i64) -> Result<usize, AppError> {
        let removed = self.cache.invalidate_candidate(candidate_id).await?;
        info!("Invalidated {} cache entries for candidate {}", removed, candidate_id);
        Ok(removed)
    }

    pub async fn invalidate_job(&self, job_id: i64) -> Result<usize, AppError> {
        let removed = self.cache.invalidate_job(job_id).await?;
        info!("Invalidated {} cache entries for job {}", removed, job_id);
        Ok(removed)
    }

    async fn store_breakdowns(&self, matches: &[MatchScore]) {
        for score in matches {
            let key = CacheKey::pair(CacheCategory::MatchBreakdown, score.candidate_id, score.job_id);
            self.cache.put_quietly(&key, score).await;
        }
    }

    /// Serves cached breakdowns, scores the misses through the ranker and
    /// orders the union like a rank over `job_ids`.
    async fn score_many(&self, candidate_id: i64, job_ids: &[i64]) -> Vec<MatchScore> {
        let mut seen = HashSet::new();
        let unique: Vec<i64> = job_ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let mut indexed = Vec::with_capacity(unique.len());
        let mut misses = Vec::new();
        for (index, job_id) in unique.iter().copied().enumerate() {
            let key = CacheKey::pair(CacheCategory::MatchBreakdown, candidate_id, job_id);
            match self.cache.get::<MatchScore>(&key).await {
                Some(score) => indexed.push((index, score)),
                None => misses.push(job_id),
            }
        }
        debug!(
            "Candidate {}: {} cached breakdowns, {} to score",
            candidate_id,
            indexed.len(),
            misses.len()
        );

        if !misses.is_empty() {
            let fresh = self.ranker.score_batch(candidate_id, &misses).await;
            self.store_breakdowns(&fresh).await;
            let positions: HashMap<i64, usize> = unique
                .iter()
                .enumerate()
                .map(|(index, job_id)| (*job_id, index))
                .collect();
            indexed.extend(
                fresh
                    .into_iter()
                    .filter_map(|score| positions.get(&score.job_id).map(|index| (*index, score))),
            );
        }

        order_by_score(indexed)
    }
}
