//! ResultCache: typed, TTL'd caching of profiles, match lists and breakdowns.
//!
//! Keys follow `career:<category>:<candidateId>[:<jobId>]`. Every put also
//! records the key in a per-candidate index (and, for job-scoped categories,
//! a per-job index) so invalidation never needs a keyspace scan.

pub mod memory;
pub mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::errors::AppError;

/// Storage primitive behind `ResultCache`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Stores `value` under `key` and adds `key` to every index in `indexes`.
    /// Indexes are kept alive for at least `index_ttl`.
    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
        indexes: &[String],
        index_ttl: Duration,
    ) -> Result<(), AppError>;

    /// Deletes every key recorded in the index, then the index itself.
    /// Returns how many index members were removed.
    async fn index_drain(&self, index: &str) -> Result<usize, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCategory {
    Profile,
    Matches,
    MatchBreakdown,
    CultureFit,
    Trajectory,
    LearningOpportunities,
    SkillGap,
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 7] = [
        CacheCategory::Profile,
        CacheCategory::Matches,
        CacheCategory::MatchBreakdown,
        CacheCategory::CultureFit,
        CacheCategory::Trajectory,
        CacheCategory::LearningOpportunities,
        CacheCategory::SkillGap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CacheCategory::Profile => "profile",
            CacheCategory::Matches => "matches",
            CacheCategory::MatchBreakdown => "match_breakdown",
            CacheCategory::CultureFit => "culture_fit",
            CacheCategory::Trajectory => "trajectory",
            CacheCategory::LearningOpportunities => "learning_opps",
            CacheCategory::SkillGap => "skill_gap",
        }
    }

    pub fn ttl(&self) -> Duration {
        let secs = match self {
            CacheCategory::Profile => 3600,
            CacheCategory::Matches => 1800,
            CacheCategory::MatchBreakdown => 1800,
            CacheCategory::CultureFit => 3600,
            CacheCategory::Trajectory => 3600,
            CacheCategory::LearningOpportunities => 1800,
            CacheCategory::SkillGap => 1800,
        };
        Duration::from_secs(secs)
    }

    /// Categories keyed by (candidate, job) that job invalidation removes.
    pub fn is_job_scoped(&self) -> bool {
        matches!(self, CacheCategory::MatchBreakdown | CacheCategory::SkillGap)
    }
}

/// Indexes must outlive every entry they list.
fn index_ttl() -> Duration {
    CacheCategory::ALL
        .iter()
        .map(CacheCategory::ttl)
        .max()
        .unwrap_or(Duration::from_secs(3600))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKey {
    pub category: CacheCategory,
    pub candidate_id: i64,
    pub job_id: Option<i64>,
}

impl CacheKey {
    pub fn candidate(category: CacheCategory, candidate_id: i64) -> Self {
        Self {
            category,
            candidate_id,
            job_id: None,
        }
    }

    pub fn pair(category: CacheCategory, candidate_id: i64, job_id: i64) -> Self {
        Self {
            category,
            candidate_id,
            job_id: Some(job_id),
        }
    }

    pub fn render(&self) -> String {
        match self.job_id {
            Some(job_id) => format!(
                "career:{}:{}:{}",
                self.category.as_str(),
                self.candidate_id,
                job_id
            ),
            None => format!("career:{}:{}", self.category.as_str(), self.candidate_id),
        }
    }
}

pub fn candidate_index_key(candidate_id: i64) -> String {
    format!("career:index:candidate:{candidate_id}")
}

pub fn job_index_key(job_id: i64) -> String {
    format!("career:index:job:{job_id}")
}

/// Shared handle to the cache. Cheap to clone.
#[derive(Clone)]
pub struct ResultCache {
    backend: Arc<dyn CacheBackend>,
}

impl ResultCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Returns `None` on absence, expiry, backend failure or an entry that no
    /// longer deserializes. Corrupt entries are deleted.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let rendered = key.render();
        let raw = match self.backend.get(&rendered).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for {rendered}");
                return None;
            }
            Err(e) => {
                warn!("Cache read failed for {rendered}, recomputing: {e}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit for {rendered}");
                Some(value)
            }
            Err(e) => {
                warn!("Discarding unreadable cache entry {rendered}: {e}");
                if let Err(e) = self.backend.delete(&rendered).await {
                    warn!("Failed to delete unreadable cache entry {rendered}: {e}");
                }
                None
            }
        }
    }

    /// Last writer wins; the category decides the TTL.
    pub async fn put<T: Serialize + ?Sized>(
        &self,
        key: &CacheKey,
        value: &T,
    ) -> Result<(), AppError> {
        let rendered = key.render();
        let payload = serde_json::to_string(value)
            .map_err(|e| AppError::Cache(format!("failed to serialize {rendered}: {e}")))?;

        let mut indexes = vec![candidate_index_key(key.candidate_id)];
        if let (true, Some(job_id)) = (key.category.is_job_scoped(), key.job_id) {
            indexes.push(job_index_key(job_id));
        }

        self.backend
            .set_with_ttl(&rendered, payload, key.category.ttl(), &indexes, index_ttl())
            .await
    }

    /// Same as `put` but only logs failures; used on read paths where a
    /// cache outage must not fail the request.
    pub async fn put_quietly<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        if let Err(e) = self.put(key, value).await {
            warn!("Cache write failed for {}: {e}", key.render());
        }
    }

    /// Removes every category cached for the candidate.
    pub async fn invalidate_candidate(&self, candidate_id: i64) -> Result<usize, AppError> {
        let removed = self
            .backend
            .index_drain(&candidate_index_key(candidate_id))
            .await?;
        debug!("Invalidated {removed} cache entries for candidate {candidate_id}");
        Ok(removed)
    }

    /// Removes every breakdown and skill-gap entry keyed to the job.
    pub async fn invalidate_job(&self, job_id: i64) -> Result<usize, AppError> {
        let removed = self.backend.index_drain(&job_index_key(job_id)).await?;
        debug!("Invalidated {removed} cache entries for job {job_id}");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryCacheBackend;
    use super::*;
    use crate::models::{MatchReasons, MatchScore, RecommendationTier, ScoreBreakdown};

    fn cache() -> (ResultCache, Arc<MemoryCacheBackend>) {
        let backend = Arc::new(MemoryCacheBackend::new());
        (ResultCache::new(backend.clone()), backend)
    }

    fn sample_score(candidate_id: i64, job_id: i64) -> MatchScore {
        MatchScore {
            candidate_id,
            job_id,
            job_title: "Senior Rust Engineer".to_string(),
            company_name: "Acme".to_string(),
            overall_score: 0.7123456789012345,
            breakdown: ScoreBreakdown {
                skill_overlap: 0.1 + 0.2,
                career_fit: 0.7,
                culture_fit: 0.8312000036239624,
                learning_opportunities: 0.45,
                motivation_alignment: 0.3,
                experience_level: 0.9,
            },
            reasons: MatchReasons {
                career_fit: Some("Aligns with individual_contributor path".to_string()),
                ..MatchReasons::default()
            },
            recommendation: RecommendationTier::Strong,
        }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            CacheKey::candidate(CacheCategory::Profile, 7).render(),
            "career:profile:7"
        );
        assert_eq!(
            CacheKey::pair(CacheCategory::MatchBreakdown, 7, 42).render(),
            "career:match_breakdown:7:42"
        );
        assert_eq!(
            CacheKey::candidate(CacheCategory::LearningOpportunities, 3).render(),
            "career:learning_opps:3"
        );
    }

    #[test]
    fn test_category_ttls() {
        assert_eq!(CacheCategory::Profile.ttl(), Duration::from_secs(3600));
        assert_eq!(CacheCategory::Matches.ttl(), Duration::from_secs(1800));
        assert_eq!(CacheCategory::CultureFit.ttl(), Duration::from_secs(3600));
        assert_eq!(CacheCategory::Trajectory.ttl(), Duration::from_secs(3600));
        assert_eq!(
            CacheCategory::LearningOpportunities.ttl(),
            Duration::from_secs(1800)
        );
        assert_eq!(index_ttl(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_breakdown_round_trips_exactly() {
        let (cache, _) = cache();
        let key = CacheKey::pair(CacheCategory::MatchBreakdown, 1, 2);
        let score = sample_score(1, 2);

        cache.put(&key, &score).await.unwrap();
        let cached: MatchScore = cache.get(&key).await.unwrap();
        assert_eq!(cached, score);
        assert_eq!(
            cached.breakdown.skill_overlap.to_bits(),
            score.breakdown.skill_overlap.to_bits()
        );
    }

    #[tokio::test]
    async fn test_nested_structures_round_trip() {
        let (cache, _) = cache();
        let key = CacheKey::candidate(CacheCategory::Trajectory, 9);
        let value = serde_json::json!({
            "roles": ["Senior Engineer", "Staff Engineer"],
            "nested": { "depth": 2, "ratio": 0.125 }
        });

        cache.put(&key, &value).await.unwrap();
        let cached: serde_json::Value = cache.get(&key).await.unwrap();
        assert_eq!(cached, value);
    }

    #[tokio::test]
    async fn test_invalidate_candidate_removes_every_category() {
        let (cache, _) = cache();
        let profile = CacheKey::candidate(CacheCategory::Profile, 1);
        let breakdown = CacheKey::pair(CacheCategory::MatchBreakdown, 1, 2);
        let other = CacheKey::pair(CacheCategory::MatchBreakdown, 5, 2);
        cache.put(&profile, "p").await.unwrap();
        cache.put(&breakdown, &sample_score(1, 2)).await.unwrap();
        cache.put(&other, &sample_score(5, 2)).await.unwrap();

        assert_eq!(cache.invalidate_candidate(1).await.unwrap(), 2);
        assert!(cache.get::<String>(&profile).await.is_none());
        assert!(cache.get::<MatchScore>(&breakdown).await.is_none());
        assert!(cache.get::<MatchScore>(&other).await.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_job_only_touches_job_scoped_entries() {
        let (cache, _) = cache();
        let breakdown = CacheKey::pair(CacheCategory::MatchBreakdown, 1, 2);
        let gap = CacheKey::pair(CacheCategory::SkillGap, 3, 2);
        let matches = CacheKey::candidate(CacheCategory::Matches, 1);
        cache.put(&breakdown, &sample_score(1, 2)).await.unwrap();
        cache.put(&gap, "gap").await.unwrap();
        cache.put(&matches, &vec![sample_score(1, 2)]).await.unwrap();

        assert_eq!(cache.invalidate_job(2).await.unwrap(), 2);
        assert!(cache.get::<MatchScore>(&breakdown).await.is_none());
        assert!(cache.get::<String>(&gap).await.is_none());
        assert!(cache.get::<Vec<MatchScore>>(&matches).await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_entry_reads_as_miss_and_is_removed() {
        let (cache, backend) = cache();
        let key = CacheKey::pair(CacheCategory::MatchBreakdown, 1, 2);
        backend
            .set_with_ttl(
                &key.render(),
                "{not json".to_string(),
                Duration::from_secs(60),
                &[],
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        assert!(cache.get::<MatchScore>(&key).await.is_none());
        assert!(backend.get(&key.render()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_reads_as_miss() {
        let (cache, _) = cache();
        let key = CacheKey::candidate(CacheCategory::Matches, 4);
        cache.put(&key, "not a list").await.unwrap();
        assert!(cache.get::<Vec<MatchScore>>(&key).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_category_ttl() {
        let (cache, _) = cache();
        let key = CacheKey::candidate(CacheCategory::Matches, 1);
        cache.put(&key, &vec![1, 2, 3]).await.unwrap();

        tokio::time::advance(Duration::from_secs(1799)).await;
        assert_eq!(cache.get::<Vec<i32>>(&key).await, Some(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get::<Vec<i32>>(&key).await.is_none());
    }
}
