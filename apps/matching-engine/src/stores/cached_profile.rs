use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::{CacheCategory, CacheKey, ResultCache};
use crate::errors::AppError;
use crate::models::CandidateCareerProfile;
use crate::stores::CareerProfileStore;

/// Read-through decorator that serves profiles from the `profile` cache
/// category. Absent candidates are not cached.
pub struct CachedProfileStore {
    inner: Arc<dyn CareerProfileStore>,
    cache: ResultCache,
}

impl CachedProfileStore {
    pub fn new(inner: Arc<dyn CareerProfileStore>, cache: ResultCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl CareerProfileStore for CachedProfileStore {
    async fn fetch_profile(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateCareerProfile>, AppError> {
        let key = CacheKey::candidate(CacheCategory::Profile, candidate_id);
        if let Some(profile) = self.cache.get::<CandidateCareerProfile>(&key).await {
            return Ok(Some(profile));
        }

        let profile = self.inner.fetch_profile(candidate_id).await?;
        if let Some(profile) = &profile {
            self.cache.put_quietly(&key, profile).await;
        }
        Ok(profile)
    }
}
