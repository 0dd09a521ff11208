//! CandidateMatchRanker scores many jobs for one candidate.
//!
//! Per-pair scorings run on a `JoinSet`, bounded by a semaphore shared by
//! every rank issued through the same ranker. Dropping a rank future drops
//! the set, which aborts whatever is still in flight.
//!
//! Ordering: results are first put back in enumeration order (ascending job
//! id for the store-backed enumerations, caller order for batches), then
//! stable-sorted by overall score descending. Equal scores therefore keep
//! enumeration order.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::matching::calculator::MatchScoreCalculator;
use crate::models::MatchScore;

pub const DEFAULT_MAX_IN_FLIGHT: usize = 16;

/// Unswiped active jobs enumerated for the daily list.
pub const DAILY_ENUMERATION_CAP: usize = 50;

/// Matches returned by the daily list.
pub const DAILY_LIMIT: usize = 10;

pub struct CandidateMatchRanker {
    calculator: Arc<MatchScoreCalculator>,
    permits: Arc<Semaphore>,
}

impl CandidateMatchRanker {
    pub fn new(calculator: Arc<MatchScoreCalculator>, max_in_flight: usize) -> Self {
        Self {
            calculator,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn calculator(&self) -> &Arc<MatchScoreCalculator> {
        &self.calculator
    }

    /// Top `limit` active jobs for the candidate, best first.
    pub async fn rank(&self, candidate_id: i64, limit: usize) -> Result<Vec<MatchScore>, AppError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let job_ids = self.calculator.jobs().active_job_ids().await?;
        info!(
            "Ranking {} active jobs for candidate {}",
            job_ids.len(),
            candidate_id
        );

        let mut scores = self.score_all(candidate_id, job_ids).await;
        scores.truncate(limit);
        Ok(scores)
    }

    /// Scores an explicit job list. Unknown jobs are skipped; duplicates are
    /// scored once.
    pub async fn score_batch(&self, candidate_id: i64, job_ids: &[i64]) -> Vec<MatchScore> {
        let mut seen = HashSet::new();
        let unique: Vec<i64> = job_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        self.score_all(candidate_id, unique).await
    }

    /// Active jobs the candidate has not swiped on yet, ascending id, capped
    /// for the daily list.
    pub async fn daily_job_ids(&self, candidate_id: i64) -> Result<Vec<i64>, AppError> {
        let job_ids = self
            .calculator
            .jobs()
            .unswiped_active_job_ids(candidate_id, DAILY_ENUMERATION_CAP)
            .await?;
        debug!(
            "Daily matching for candidate {} over {} unswiped jobs",
            candidate_id,
            job_ids.len()
        );
        Ok(job_ids)
    }

    async fn score_all(&self, candidate_id: i64, job_ids: Vec<i64>) -> Vec<MatchScore> {
        let mut tasks = JoinSet::new();
        for (index, job_id) in job_ids.into_iter().enumerate() {
            let calculator = Arc::clone(&self.calculator);
            let permits = Arc::clone(&self.permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => calculator.score(candidate_id, job_id).await,
                    Err(_) => Err(AppError::Internal(anyhow!("ranking semaphore closed"))),
                };
                (index, job_id, result)
            });
        }

        let mut scored = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, _, Ok(score))) => scored.push((index, score)),
                Ok((_, job_id, Err(e))) if e.is_not_found() => {
                    debug!("Skipping job {job_id} for candidate {candidate_id}: {e}");
                }
                Ok((_, job_id, Err(e))) => {
                    warn!(
                        "Failed to score job {job_id} for candidate {candidate_id} ({}): {e}",
                        e.code()
                    );
                }
                Err(e) => warn!("Scoring task for candidate {candidate_id} did not finish: {e}"),
            }
        }

        order_by_score(scored)
    }
}

/// Restores enumeration order from the indexes, then stable-sorts by overall
/// score descending.
pub fn order_by_score(mut indexed: Vec<(usize, MatchScore)>) -> Vec<MatchScore> {
    indexed.sort_unstable_by_key(|(index, _)| *index);
    let mut scores: Vec<MatchScore> = indexed.into_iter().map(|(_, score)| score).collect();
    scores.sort_by(|a, b| b.overall_score.total_cmp(&a.overall_score));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::calculator::tests::Fixture;
    use crate::matching::weights::MatchWeights;
    use crate::stores::memory::{sample_job, InMemoryJobStore};

    fn ranker(fixture: Fixture) -> CandidateMatchRanker {
        CandidateMatchRanker::new(Arc::new(fixture.calculator()), 4)
    }

    fn ranker_with_jobs(store: Arc<InMemoryJobStore>) -> CandidateMatchRanker {
        let mut sources = Fixture::default().sources();
        sources.jobs = store;
        let calculator = MatchScoreCalculator::new(sources, MatchWeights::default()).unwrap();
        CandidateMatchRanker::new(Arc::new(calculator), 4)
    }

    /// Jobs whose only difference is the experience gap to the sample profile (5 years).
    fn job_with_min_experience(id: i64, min_experience: i32) -> crate::models::JobOpportunity {
        let mut job = sample_job(id);
        job.min_experience = min_experience;
        job
    }

    #[tokio::test]
    async fn test_rank_skips_missing_jobs_and_sorts_descending() {
        let fixture = Fixture {
            jobs: vec![
                job_with_min_experience(1, 0),
                job_with_min_experience(3, 5),
                job_with_min_experience(5, 3),
            ],
            active: Some(vec![1, 2, 3, 4, 5]),
            ..Fixture::default()
        };
        let scores = ranker(fixture).rank(1, 10).await.unwrap();

        assert_eq!(scores.len(), 3);
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![3, 5, 1]);
        assert!(scores
            .windows(2)
            .all(|w| w[0].overall_score >= w[1].overall_score));
    }

    #[tokio::test]
    async fn test_rank_truncates_to_limit() {
        let fixture = Fixture {
            jobs: (1..=6).map(|id| job_with_min_experience(id, id as i32)).collect(),
            ..Fixture::default()
        };
        let scores = ranker(fixture).rank(1, 2).await.unwrap();
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![5, 4]);
    }

    #[tokio::test]
    async fn test_rank_with_zero_limit_is_empty() {
        assert!(ranker(Fixture::default()).rank(1, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_enumeration_order() {
        let fixture = Fixture {
            jobs: vec![sample_job(30), sample_job(10), sample_job(20)],
            ..Fixture::default()
        };
        let scores = ranker(fixture).rank(1, 10).await.unwrap();
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_missing_candidate_yields_empty_rank() {
        let scores = ranker(Fixture::default()).rank(404, 10).await.unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_score_batch_keeps_caller_order_for_ties_and_dedups() {
        let fixture = Fixture {
            jobs: vec![sample_job(1), sample_job(2), sample_job(3)],
            ..Fixture::default()
        };
        let scores = ranker(fixture).score_batch(1, &[3, 1, 3, 99, 2]).await;
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_daily_ids_exclude_swiped_jobs() {
        let store = InMemoryJobStore::new((1..=4).map(sample_job).collect())
            .swipe(1, 2)
            .swipe(7, 3);
        let ids = ranker_with_jobs(Arc::new(store)).daily_job_ids(1).await.unwrap();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[tokio::test]
    async fn test_daily_ids_are_capped() {
        let store = Arc::new(InMemoryJobStore::new((1..=60).map(sample_job).collect()));
        let ids = ranker_with_jobs(store).daily_job_ids(1).await.unwrap();
        assert_eq!(ids, (1..=DAILY_ENUMERATION_CAP as i64).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_rank_survives_a_failing_job_read() {
        let store = InMemoryJobStore::new((1..=3).map(sample_job).collect()).fail_reads_of(2);
        let scores = ranker_with_jobs(Arc::new(store)).rank(1, 10).await.unwrap();
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_score_batch_survives_a_failing_job_read() {
        let store = InMemoryJobStore::new((1..=3).map(sample_job).collect()).fail_reads_of(3);
        let scores = ranker_with_jobs(Arc::new(store)).score_batch(1, &[3, 2, 1]).await;
        let ids: Vec<i64> = scores.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_order_by_score_breaks_ties_by_index() {
        let mut low = crate::matching::calculator::tests::blank_score(7);
        low.overall_score = 0.2;
        let mut high = crate::matching::calculator::tests::blank_score(8);
        high.overall_score = 0.9;
        let tie = crate::matching::calculator::tests::blank_score(9);
        let mut tie_first = crate::matching::calculator::tests::blank_score(6);
        tie_first.overall_score = tie.overall_score;

        let ordered = order_by_score(vec![(3, tie), (0, low), (2, high), (1, tie_first)]);
        let ids: Vec<i64> = ordered.iter().map(|s| s.job_id).collect();
        assert_eq!(ids, vec![8, 6, 9, 7]);
    }

    #[tokio::test]
    async fn test_single_permit_still_scores_everything() {
        let fixture = Fixture {
            jobs: (1..=5).map(sample_job).collect(),
            ..Fixture::default()
        };
        let ranker = CandidateMatchRanker::new(Arc::new(fixture.calculator()), 0);
        assert_eq!(ranker.rank(1, 10).await.unwrap().len(), 5);
    }
}
