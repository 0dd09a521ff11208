use thiserror::Error;

/// Application-level error type.
///
/// `NotFound` is the only miss a caller is expected to recover from. Signal
/// failures (`Graph`, `Vector`, `Embedding`) are absorbed by the calculator
/// and never reach a caller of `score` or `rank`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Graph store error: {0}")]
    Graph(String),

    #[error("Vector store error: {0}")]
    Vector(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    /// Stable machine code, included in logs.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Graph(_) => "GRAPH_ERROR",
            AppError::Vector(_) => "VECTOR_ERROR",
            AppError::Embedding(_) => "EMBEDDING_ERROR",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e.to_string())
    }
}

impl From<qdrant_client::QdrantError> for AppError {
    fn from(e: qdrant_client::QdrantError) -> Self {
        AppError::Vector(e.to_string())
    }
}
