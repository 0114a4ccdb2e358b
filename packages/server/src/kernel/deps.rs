//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by the post
//! actions, the search service and the binaries.

use sqlx::PgPool;
use std::sync::Arc;

use crate::domains::posts::actions::{EmbedPostJob, EmbeddingPipeline};
use crate::domains::posts::anchors::AnchorCache;
use crate::domains::posts::search::SearchService;
use crate::domains::posts::vector_store::VectorStore;
use crate::kernel::jobs::JobQueue;
use crate::kernel::BaseEmbeddingService;

/// Server dependencies accessible to actions
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub embedding_service: Arc<dyn BaseEmbeddingService>,
    pub vector_store: Arc<dyn VectorStore>,
    /// Category anchors, computed once per process
    pub anchors: Arc<AnchorCache>,
    /// Where post creation drops embedding jobs after commit
    pub embedding_jobs: Arc<dyn JobQueue<EmbedPostJob>>,
    pub search_result_limit: usize,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        embedding_service: Arc<dyn BaseEmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        anchors: Arc<AnchorCache>,
        embedding_jobs: Arc<dyn JobQueue<EmbedPostJob>>,
        search_result_limit: usize,
    ) -> Self {
        Self {
            db_pool,
            embedding_service,
            vector_store,
            anchors,
            embedding_jobs,
            search_result_limit,
        }
    }

    pub fn pipeline(&self) -> EmbeddingPipeline {
        EmbeddingPipeline::new(
            self.embedding_service.clone(),
            self.anchors.clone(),
            self.vector_store.clone(),
        )
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(
            self.embedding_service.clone(),
            self.vector_store.clone(),
            self.search_result_limit,
        )
    }
}
