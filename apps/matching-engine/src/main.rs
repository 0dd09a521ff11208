mod cache;
mod config;
mod db;
mod embedding;
mod errors;
mod matching;
mod models;
mod stores;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::memory::MemoryCacheBackend;
use crate::cache::redis_store::RedisCacheBackend;
use crate::cache::{CacheBackend, ResultCache};
use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::HttpEmbeddingClient;
use crate::matching::ranker::DEFAULT_MAX_IN_FLIGHT;
use crate::matching::{
    CandidateMatchRanker, DeclaredSkillOverlap, MatchScoreCalculator, MatchSources,
    MatchingService,
};
use crate::stores::cached_profile::CachedProfileStore;
use crate::stores::neo4j::Neo4jTrajectoryIndex;
use crate::stores::postgres::{PgCareerProfileStore, PgJobOpportunityStore};
use crate::stores::qdrant::QdrantCultureIndex;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", about = "Multi-signal job match scoring")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score one candidate against one job.
    Score { candidate_id: i64, job_id: i64 },
    /// Rank every active job for a candidate.
    Rank {
        candidate_id: i64,
        #[arg(long, short = 'n', default_value_t = 20)]
        limit: usize,
    },
    /// Top matches among jobs the candidate has not swiped on.
    Daily { candidate_id: i64 },
    /// Score an explicit list of jobs.
    Batch {
        candidate_id: i64,
        #[arg(required = true, num_args = 1..)]
        job_ids: Vec<i64>,
    },
    /// Required and nice-to-have skills the candidate has and lacks.
    SkillGap { candidate_id: i64, job_id: i64 },
    /// Top matches ordered by what the candidate would learn.
    Learning {
        candidate_id: i64,
        #[arg(long, short = 'n', default_value_t = 10)]
        limit: usize,
    },
    InvalidateCandidate { candidate_id: i64 },
    InvalidateJob { job_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (fails on missing required env vars or bad weights)
    let config = Config::from_env()?;

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME").replace('-', "_"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting matching engine v{}", env!("CARGO_PKG_VERSION"));

    if let Some(notice) = invalidation_notice(&args.command, config.redis_url.as_deref()) {
        warn!("{notice}");
    }

    let service = build_service(&config).await?;

    match args.command {
        Command::Score {
            candidate_id,
            job_id,
        } => {
            let score = service.score(candidate_id, job_id).await?;
            info!("{}", score.recommendation.headline());
            print_json(&score)
        }
        Command::Rank {
            candidate_id,
            limit,
        } => print_json(&service.rank(candidate_id, limit).await?),
        Command::Daily { candidate_id } => print_json(&service.rank_daily(candidate_id).await?),
        Command::Batch {
            candidate_id,
            job_ids,
        } => print_json(&service.score_batch(candidate_id, &job_ids).await),
        Command::SkillGap {
            candidate_id,
            job_id,
        } => print_json(&service.skill_gap(candidate_id, job_id).await?),
        Command::Learning {
            candidate_id,
            limit,
        } => print_json(&service.learning_opportunities(candidate_id, limit).await?),
        Command::InvalidateCandidate { candidate_id } => print_json(&serde_json::json!({
            "candidate_id": candidate_id,
            "removed": service.invalidate_candidate(candidate_id).await?,
        })),
        Command::InvalidateJob { job_id } => print_json(&serde_json::json!({
            "job_id": job_id,
            "removed": service.invalidate_job(job_id).await?,
        })),
    }
}

async fn build_service(config: &Config) -> Result<MatchingService> {
    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.database_max_connections).await?;

    // Initialize cache (Redis when configured, in-process otherwise)
    let backend: Arc<dyn CacheBackend> = match &config.redis_url {
        Some(url) => Arc::new(
            RedisCacheBackend::connect(url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => {
            info!("REDIS_URL not set, caching in process");
            Arc::new(MemoryCacheBackend::new())
        }
    };
    let cache = ResultCache::new(backend);

    // Initialize graph, vector and embedding clients
    let trajectories = Neo4jTrajectoryIndex::new(config.neo4j.clone())?;
    info!("Neo4j trajectory index at {}", config.neo4j.url);

    let cultures = QdrantCultureIndex::new(
        &config.qdrant_url,
        config.qdrant_api_key.clone(),
        config.culture_collection.clone(),
        config.embedding.dimensions,
    )?;
    info!(
        "Qdrant culture index at {} (collection: {})",
        config.qdrant_url, config.culture_collection
    );

    let embedder = HttpEmbeddingClient::new(config.embedding.clone())?;
    info!("Embedding client initialized (model: {})", config.embedding.model);

    let sources = MatchSources {
        profiles: Arc::new(CachedProfileStore::new(
            Arc::new(PgCareerProfileStore::new(db.clone())),
            cache.clone(),
        )),
        jobs: Arc::new(PgJobOpportunityStore::new(db)),
        trajectories: Arc::new(trajectories),
        cultures: Arc::new(cultures),
        embedder: Arc::new(embedder),
        skills: Arc::new(DeclaredSkillOverlap),
    };
    let calculator = MatchScoreCalculator::new(sources, config.weights)?.with_cache(cache.clone());

    let concurrency = if config.rank_concurrency == 0 {
        DEFAULT_MAX_IN_FLIGHT
    } else {
        config.rank_concurrency
    };
    info!("Ranking with up to {concurrency} concurrent scorings");
    let ranker = CandidateMatchRanker::new(Arc::new(calculator), concurrency);

    Ok(MatchingService::new(Arc::new(ranker), cache))
}

/// Invalidation against the in-process cache only sees this process's own
/// entries, which a fresh CLI invocation never has.
fn invalidation_notice(command: &Command, redis_url: Option<&str>) -> Option<&'static str> {
    let invalidates = matches!(
        command,
        Command::InvalidateCandidate { .. } | Command::InvalidateJob { .. }
    );
    (invalidates && redis_url.is_none()).then_some(
        "REDIS_URL not set: invalidating the in-process cache of this run only, shared cache entries are untouched",
    )
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
