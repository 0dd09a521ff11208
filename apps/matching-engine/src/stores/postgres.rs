use async_trait::async_trait;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::{CandidateCareerProfile, JobOpportunity};
use crate::stores::{CareerProfileStore, JobOpportunityStore};

/// Reads career profiles from `candidate_profiles`.
#[derive(Clone)]
pub struct PgCareerProfileStore {
    pool: PgPool,
}

impl PgCareerProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CareerProfileStore for PgCareerProfileStore {
    async fn fetch_profile(
        &self,
        candidate_id: i64,
    ) -> Result<Option<CandidateCareerProfile>, AppError> {
        let profile = sqlx::query_as::<_, CandidateCareerProfile>(
            r#"
            SELECT
                cp.id::bigint                                 AS candidate_id,
                COALESCE(cp.past_motivations, '{}')           AS past_motivations,
                COALESCE(cp.proudest_achievements, '{}')      AS proudest_achievements,
                COALESCE(cp.current_interests, '{}')          AS current_interests,
                COALESCE(cp.ideal_work_environment, '')       AS ideal_work_environment,
                COALESCE(cp.learning_priorities, '{}')        AS learning_priorities,
                COALESCE(cp.deal_breakers, '{}')              AS deal_breakers,
                COALESCE(cp.motivations, '{}')                AS motivations,
                COALESCE(cp.career_trajectory, '')            AS career_trajectory,
                COALESCE(cp.five_year_goals, '{}')            AS five_year_goals,
                COALESCE(cp.dream_companies, '{}')            AS dream_companies,
                COALESCE(cp.skills_to_develop, '{}')          AS skills_to_develop,
                COALESCE(cp.long_term_vision, '')             AS long_term_vision,
                COALESCE(cp.years_experience, 0)::int         AS years_experience,
                COALESCE(cp.title, '')                        AS current_title,
                ARRAY(
                    SELECT s.name
                    FROM candidate_skills cs
                    JOIN skills s ON s.id = cs.skill_id
                    WHERE cs.user_id = cp.user_id
                    ORDER BY s.name
                )                                             AS skills
            FROM candidate_profiles cp
            WHERE cp.id = $1
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }
}

/// Reads jobs (joined with their company) from `jobs` / `companies`.
#[derive(Clone)]
pub struct PgJobOpportunityStore {
    pool: PgPool,
}

impl PgJobOpportunityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobOpportunityStore for PgJobOpportunityStore {
    async fn fetch_job(&self, job_id: i64) -> Result<Option<JobOpportunity>, AppError> {
        let job = sqlx::query_as::<_, JobOpportunity>(
            r#"
            SELECT
                j.id::bigint                              AS id,
                j.title                                   AS title,
                COALESCE(j.description, '')               AS description,
                COALESCE(j.required_skills, '{}')         AS required_skills,
                COALESCE(j.nice_to_have_skills, '{}')     AS nice_to_have_skills,
                COALESCE(j.min_experience, 0)::int        AS min_experience,
                COALESCE(j.max_experience, 20)::int       AS max_experience,
                j.min_salary::int                         AS min_salary,
                j.max_salary::int                         AS max_salary,
                c.name                                    AS company_name,
                COALESCE(c.description, '')               AS company_description
            FROM jobs j
            JOIN companies c ON c.id = j.company_id
            WHERE j.id = $1
            "#,
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(job)
    }

    async fn active_job_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT id::bigint FROM jobs WHERE status = 'active' ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn unswiped_active_job_ids(
        &self,
        candidate_id: i64,
        cap: usize,
    ) -> Result<Vec<i64>, AppError> {
        let cap = i64::try_from(cap)
            .map_err(|_| AppError::Validation(format!("job cap {cap} is out of range")))?;

        Ok(sqlx::query_scalar::<_, i64>(
            r#"
            SELECT j.id::bigint
            FROM jobs j
            WHERE j.status = 'active'
              AND j.id NOT IN (
                  SELECT s.job_id FROM swipes s
                  WHERE s.user_id = (
                      SELECT cp.user_id FROM candidate_profiles cp WHERE cp.id = $1
                  )
              )
            ORDER BY j.id
            LIMIT $2
            "#,
        )
        .bind(candidate_id)
        .bind(cap)
        .fetch_all(&self.pool)
        .await?)
    }
}
