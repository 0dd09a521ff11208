use std::str::FromStr;

use anyhow::{Context, Result};

use crate::embedding::EmbeddingSettings;
use crate::matching::MatchWeights;
use crate::stores::neo4j::Neo4jSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or the match weights
/// do not validate.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    /// When unset, results are cached in process.
    pub redis_url: Option<String>,
    pub neo4j: Neo4jSettings,
    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,
    pub culture_collection: String,
    pub embedding: EmbeddingSettings,
    pub rank_concurrency: usize,
    pub weights: MatchWeights,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let weights = match optional_env("MATCH_WEIGHTS") {
            Some(raw) => MatchWeights::from_json(&raw)?,
            None => MatchWeights::default().validate()?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: optional_env("REDIS_URL"),
            neo4j: Neo4jSettings {
                url: env_or("NEO4J_URL", "http://localhost:7474"),
                user: env_or("NEO4J_USER", "neo4j"),
                password: env_or("NEO4J_PASSWORD", ""),
                database: env_or("NEO4J_DATABASE", "neo4j"),
            },
            qdrant_url: env_or("QDRANT_URL", "http://localhost:6334"),
            qdrant_api_key: optional_env("QDRANT_API_KEY"),
            culture_collection: env_or("CULTURE_COLLECTION", "work_culture_embeddings"),
            embedding: EmbeddingSettings {
                api_url: env_or("EMBEDDING_API_URL", "https://api.openai.com/v1/embeddings"),
                api_key: require_env("EMBEDDING_API_KEY")?,
                model: env_or("EMBEDDING_MODEL", "text-embedding-3-small"),
                dimensions: parse_env("EMBEDDING_DIMENSIONS", 768)?,
            },
            rank_concurrency: parse_env("RANK_CONCURRENCY", 16)?,
            weights,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
