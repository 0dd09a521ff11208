use serde::{Deserialize, Serialize};

/// A career-progression pattern from the trajectory graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPattern {
    pub key: String,
    /// Title fragments of the roles people on this path typically move into.
    pub typical_roles: Vec<String>,
}

/// One nearest-neighbour hit against the work-culture collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CultureMatch {
    pub culture_id: String,
    pub score: f32,
    pub culture_type: String,
    pub description: String,
    pub characteristics: Vec<String>,
}
