// ServerKernel - core infrastructure with all dependencies
//
// Owns the database pool, the embedding client and the background job runner
// that drains embedding jobs. Dropping the kernel without `shutdown` abandons
// queued jobs.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::deps::ServerDeps;
use super::jobs::{job_channel, JobRunner, JobRunnerConfig, JobRunnerHandle};
use super::BaseEmbeddingService;
use crate::common::utils::EmbeddingService;
use crate::config::Config;
use crate::domains::posts::actions::EmbedPostJob;
use crate::domains::posts::anchors::AnchorCache;
use crate::domains::posts::vector_store::{PgVectorStore, VectorStore};

/// ServerKernel holds all server dependencies
pub struct ServerKernel {
    pub deps: ServerDeps,
    runner: JobRunnerHandle,
}

impl ServerKernel {
    /// Connect to the database and start the embedding job runner.
    pub async fn start(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        if config.embedding.api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY is not set; posts will not be embedded or categorized");
        }
        let embedding_service = Arc::new(EmbeddingService::new(config.embedding.clone())?);

        Ok(Self::with_services(
            pool.clone(),
            embedding_service,
            Arc::new(PgVectorStore::new(pool)),
            config.embedding_workers,
            config.search_result_limit,
        ))
    }

    /// Build a kernel around already-constructed services (tests use mocks here).
    pub fn with_services(
        db_pool: PgPool,
        embedding_service: Arc<dyn BaseEmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        embedding_workers: usize,
        search_result_limit: usize,
    ) -> Self {
        let (queue, receiver) = job_channel::<EmbedPostJob>();

        let deps = ServerDeps::new(
            db_pool,
            embedding_service,
            vector_store,
            Arc::new(AnchorCache::new()),
            Arc::new(queue),
            search_result_limit,
        );

        let config = JobRunnerConfig::builder()
            .max_concurrency(embedding_workers)
            .worker_id("embedding-runner")
            .build();
        let runner = JobRunner::with_config(receiver, Arc::new(deps.pipeline()), config).spawn();

        info!(embedding_workers, "Server kernel started");
        Self { deps, runner }
    }

    /// Stop accepting embedding jobs and wait for queued ones to finish.
    pub async fn shutdown(self) {
        self.runner.shutdown().await;
        info!("Server kernel stopped");
    }
}
