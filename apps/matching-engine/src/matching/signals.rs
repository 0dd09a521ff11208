//! Sub-score signals. Pure functions over a profile/job snapshot.
//!
//! Each returns a [`Signal`]: a score in [0, 1] and an optional reason.
//! Store lookups (trajectory roles, culture hits) are resolved by the
//! calculator and passed in, so everything here is deterministic.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::vocabulary::KeywordTable;
use crate::models::{CandidateCareerProfile, CultureMatch, JobOpportunity};

/// Fallback score when a signal source is unavailable or the candidate gave
/// nothing to match on.
pub const NEUTRAL_SCORE: f64 = 0.5;

pub const CULTURE_NO_PREFERENCE: &str = "No preference specified for work culture";
pub const CULTURE_UNAVAILABLE: &str = "Culture fit calculation unavailable";
pub const TRAJECTORY_UNAVAILABLE: &str = "Career trajectory data unavailable";
pub const NO_MOTIVATIONS: &str = "No motivations specified";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub score: f64,
    pub reason: Option<String>,
}

impl Signal {
    pub fn neutral(reason: &str) -> Self {
        Self {
            score: NEUTRAL_SCORE,
            reason: Some(reason.to_string()),
        }
    }

    fn from_parts(score: f64, reasons: Vec<String>) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            reason: if reasons.is_empty() {
                None
            } else {
                Some(reasons.join(" | "))
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Skill overlap (pluggable)
// ────────────────────────────────────────────────────────────────────────────

/// The skill-matching signal. Swap the implementation to plug in a richer
/// matcher; the calculator only consumes the [0, 1] output.
#[async_trait]
pub trait SkillOverlapSignal: Send + Sync {
    async fn skill_overlap(
        &self,
        profile: &CandidateCareerProfile,
        job: &JobOpportunity,
    ) -> Result<Signal, AppError>;
}

/// Default: compares demonstrated skills with the job's skill lists.
/// Required skills count fully, nice-to-have skills count half.
pub struct DeclaredSkillOverlap;

#[async_trait]
impl SkillOverlapSignal for DeclaredSkillOverlap {
    async fn skill_overlap(
        &self,
        profile: &CandidateCareerProfile,
        job: &JobOpportunity,
    ) -> Result<Signal, AppError> {
        Ok(declared_skill_overlap(profile, job))
    }
}

fn normalized(skills: &[String]) -> BTreeSet<String> {
    skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn declared_skill_overlap(profile: &CandidateCareerProfile, job: &JobOpportunity) -> Signal {
    let have = normalized(&profile.skills);
    let required = normalized(&job.required_skills);
    let nice: BTreeSet<String> = normalized(&job.nice_to_have_skills)
        .difference(&required)
        .cloned()
        .collect();

    let possible = required.len() as f64 + 0.5 * nice.len() as f64;
    if possible == 0.0 {
        return Signal::neutral("Job lists no skills");
    }

    let required_hits = required.intersection(&have).count();
    let nice_hits = nice.intersection(&have).count();
    let score = (required_hits as f64 + 0.5 * nice_hits as f64) / possible;

    Signal::from_parts(
        score,
        vec![format!(
            "Has {required_hits}/{} required and {nice_hits}/{} nice-to-have skills",
            required.len(),
            nice.len()
        )],
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Career fit
// ────────────────────────────────────────────────────────────────────────────

/// Additive, capped at 1.0:
/// +0.4 first five-year goal that contains or is contained by the job title,
/// +0.3 first typical-role fragment of the trajectory found in the title,
/// +min(0.3, 0.1 × |skills_to_develop ∩ nice_to_have|).
pub fn career_fit(
    profile: &CandidateCareerProfile,
    job: &JobOpportunity,
    typical_roles: &[String],
) -> Signal {
    let mut score = 0.0;
    let mut reasons = Vec::new();
    let job_title = job.title.to_lowercase();

    if let Some(goal) = profile.five_year_goals.iter().find(|goal| {
        let goal = goal.trim().to_lowercase();
        !goal.is_empty()
            && !job_title.is_empty()
            && (job_title.contains(&goal) || goal.contains(&job_title))
    }) {
        score += 0.4;
        reasons.push(format!("Job title matches 5-year goal: {goal}"));
    }

    let role_hit = typical_roles.iter().any(|role| {
        let role = role.trim().to_lowercase();
        !role.is_empty() && job_title.contains(&role)
    });
    if role_hit {
        score += 0.3;
        reasons.push(format!("Aligns with {} path", profile.career_trajectory));
    }

    let to_develop: BTreeSet<&str> = profile.skills_to_develop.iter().map(String::as_str).collect();
    let nice: BTreeSet<&str> = job.nice_to_have_skills.iter().map(String::as_str).collect();
    let learning_match = to_develop.intersection(&nice).count();
    if learning_match > 0 {
        score += f64::min(0.3, learning_match as f64 * 0.1);
        reasons.push(format!("Offers learning in {learning_match} desired skills"));
    }

    Signal::from_parts(score.min(1.0), reasons)
}

// ────────────────────────────────────────────────────────────────────────────
// Culture fit
// ────────────────────────────────────────────────────────────────────────────

/// Uses the top nearest-neighbour hit's similarity directly. No hits means
/// the index had nothing to offer, which reads as unavailable.
pub fn culture_fit_from_hits(hits: &[CultureMatch]) -> Signal {
    match hits.first() {
        Some(top) => Signal {
            score: f64::from(top.score).clamp(0.0, 1.0),
            reason: Some(format!("Matches {} culture", top.culture_type)),
        },
        None => Signal::neutral(CULTURE_UNAVAILABLE),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Learning opportunities
// ────────────────────────────────────────────────────────────────────────────

/// min(1.0, 0.25 × learnable skills), then at most one title-step bonus:
/// "senior" in the job title but not the current title, else "staff" or
/// "principal" in the job title. Capped at 1.0.
pub fn learning_opportunities(profile: &CandidateCareerProfile, job: &JobOpportunity) -> Signal {
    let mut score = 0.0;
    let mut reasons = Vec::new();

    let learnable = learnable_skills(profile, job);
    if !learnable.is_empty() {
        score = f64::min(learnable.len() as f64 * 0.25, 1.0);
        reasons.push(format!("Learn {} desired skills", learnable.len()));
    }

    let current_title = profile.current_title.to_lowercase();
    let job_title = job.title.to_lowercase();
    if job_title.contains("senior") && !current_title.contains("senior") {
        score += 0.2;
        reasons.push("Step up to senior role".to_string());
    } else if job_title.contains("staff") || job_title.contains("principal") {
        score += 0.2;
        reasons.push("Advanced IC opportunity".to_string());
    }

    Signal::from_parts(score.min(1.0), reasons)
}

/// skills_to_develop ∩ (required ∪ nice_to_have), exact names, sorted.
pub fn learnable_skills(profile: &CandidateCareerProfile, job: &JobOpportunity) -> Vec<String> {
    let offered: BTreeSet<&str> = job
        .required_skills
        .iter()
        .chain(job.nice_to_have_skills.iter())
        .map(String::as_str)
        .collect();
    profile
        .skills_to_develop
        .iter()
        .map(String::as_str)
        .filter(|s| offered.contains(s))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Motivation alignment
// ────────────────────────────────────────────────────────────────────────────

/// +0.3 per declared motivation whose keywords appear in the job or company
/// description, capped at 1.0.
pub fn motivation_alignment(
    profile: &CandidateCareerProfile,
    job: &JobOpportunity,
    table: &KeywordTable,
) -> Signal {
    if profile.motivations.is_empty() {
        return Signal::neutral(NO_MOTIVATIONS);
    }

    let job_description = job.description.to_lowercase();
    let company_description = job.company_description.to_lowercase();

    let mut score = 0.0;
    let mut matched: Vec<&str> = Vec::new();
    for motivation in &profile.motivations {
        let hit = table
            .keywords(motivation)
            .iter()
            .any(|k| job_description.contains(k.as_str()) || company_description.contains(k.as_str()));
        if hit {
            score += 0.3;
            matched.push(motivation);
        }
    }

    Signal {
        score: f64::min(score, 1.0),
        reason: if matched.is_empty() {
            None
        } else {
            Some(format!("Aligns with: {}", matched.join(", ")))
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Experience level
// ────────────────────────────────────────────────────────────────────────────

/// max(0, 1 − |years − min_experience| / 10)
pub fn experience_level(profile: &CandidateCareerProfile, job: &JobOpportunity) -> Signal {
    let diff = (i64::from(profile.years_experience) - i64::from(job.min_experience)).abs();
    let score = (1.0 - diff as f64 / 10.0).max(0.0);
    Signal {
        score,
        reason: Some(format!(
            "{} years of experience against a {}-year minimum",
            profile.years_experience, job.min_experience
        )),
    }
}
