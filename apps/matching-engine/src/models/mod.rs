pub mod culture;
pub mod job;
pub mod match_score;
pub mod profile;

pub use culture::{CultureMatch, TrajectoryPattern};
pub use job::JobOpportunity;
pub use match_score::{MatchReasons, MatchScore, RecommendationTier, ScoreBreakdown};
pub use profile::CandidateCareerProfile;
