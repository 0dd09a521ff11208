pub mod calculator;
pub mod ranker;
pub mod service;
pub mod signals;
pub mod vocabulary;
pub mod weights;

pub use calculator::{MatchScoreCalculator, MatchSources};
pub use ranker::CandidateMatchRanker;
pub use service::MatchingService;
pub use signals::DeclaredSkillOverlap;
pub use weights::MatchWeights;
