//! Generate embedding action - embeds a committed post and files it under a category

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::common::PostId;
use crate::domains::posts::anchors::AnchorCache;
use crate::domains::posts::categories::Category;
use crate::domains::posts::categorize::classify;
use crate::domains::posts::vector_store::VectorStore;
use crate::kernel::jobs::{JobHandler, JobQueue};
use crate::kernel::unit_of_work::UnitOfWork;
use crate::kernel::{BaseEmbeddingService, EmbeddingError};

/// Background job: embed and categorize one post.
///
/// Carries only the id; the pipeline re-reads the committed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedPostJob {
    pub post_id: PostId,
}

/// Why a pipeline run was abandoned
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingFailure {
    #[error("post not found")]
    PostNotFound,

    #[error("failed to load post: {0}")]
    Load(#[source] anyhow::Error),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("failed to initialize category anchors: {0}")]
    Anchors(#[source] EmbeddingError),

    #[error("failed to save embedding: {0}")]
    Store(#[source] anyhow::Error),
}

/// Result of one pipeline run
#[derive(Debug)]
pub enum EmbeddingOutcome {
    Generated {
        post_id: PostId,
        category: Category,
        dimensions: usize,
    },
    Failed {
        post_id: PostId,
        reason: EmbeddingFailure,
    },
}

impl EmbeddingOutcome {
    pub fn is_generated(&self) -> bool {
        matches!(self, EmbeddingOutcome::Generated { .. })
    }
}

/// Embeds committed posts and classifies them against the category anchors.
#[derive(Clone)]
pub struct EmbeddingPipeline {
    embedder: Arc<dyn BaseEmbeddingService>,
    anchors: Arc<AnchorCache>,
    store: Arc<dyn VectorStore>,
}

impl EmbeddingPipeline {
    pub fn new(
        embedder: Arc<dyn BaseEmbeddingService>,
        anchors: Arc<AnchorCache>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            embedder,
            anchors,
            store,
        }
    }

    /// Run the pipeline for one post.
    ///
    /// This action:
    /// 1. Re-loads the post by id
    /// 2. Embeds its content
    /// 3. Classifies the vector against the anchors (initializing them on first use)
    /// 4. Saves embedding and category in a single write
    ///
    /// Any failure is logged with the post id and abandons the run; nothing is
    /// written and nothing is returned to whoever created the post.
    #[instrument(skip(self))]
    pub async fn run(&self, post_id: PostId) -> EmbeddingOutcome {
        match self.try_run(post_id).await {
            Ok((category, dimensions)) => {
                info!(post_id = %post_id, category = %category, "Embedding generated and saved for post");
                EmbeddingOutcome::Generated {
                    post_id,
                    category,
                    dimensions,
                }
            }
            Err(reason) => {
                log_failure(post_id, &reason);
                EmbeddingOutcome::Failed { post_id, reason }
            }
        }
    }

    async fn try_run(&self, post_id: PostId) -> Result<(Category, usize), EmbeddingFailure> {
        let post = self
            .store
            .get_by_id(post_id)
            .await
            .map_err(EmbeddingFailure::Load)?
            .ok_or(EmbeddingFailure::PostNotFound)?;

        let embedding = self.embedder.generate(&post.content).await?;
        debug!(post_id = %post_id, dimensions = embedding.len(), "Generated embedding");

        let anchors = self
            .anchors
            .get_anchors(self.embedder.as_ref())
            .await
            .map_err(EmbeddingFailure::Anchors)?;
        let category = classify(&embedding, &anchors);

        self.store
            .update_embedding_and_category(post_id, &embedding, category)
            .await
            .map_err(EmbeddingFailure::Store)?;

        Ok((category, embedding.len()))
    }
}

fn log_failure(post_id: PostId, reason: &EmbeddingFailure) {
    match reason {
        EmbeddingFailure::Embedding(e) | EmbeddingFailure::Anchors(e) if e.is_configuration() => {
            warn!(post_id = %post_id, kind = e.kind(), error = %reason, "Skipping embedding: service not configured");
        }
        EmbeddingFailure::Embedding(e) | EmbeddingFailure::Anchors(e) => {
            error!(post_id = %post_id, kind = e.kind(), error = %reason, "Failed to generate embedding");
        }
        EmbeddingFailure::PostNotFound => {
            warn!(post_id = %post_id, "Post not found, skipping embedding");
        }
        EmbeddingFailure::Load(_) | EmbeddingFailure::Store(_) => {
            error!(post_id = %post_id, error = %reason, "Failed to generate embedding");
        }
    }
}

#[async_trait]
impl JobHandler<EmbedPostJob> for EmbeddingPipeline {
    async fn handle(&self, job: EmbedPostJob) {
        self.run(job.post_id).await;
    }
}

/// Enqueue the embedding job for `post_id` once `uow` commits.
pub fn schedule_embedding(
    uow: &mut UnitOfWork,
    queue: Arc<dyn JobQueue<EmbedPostJob>>,
    post_id: PostId,
) {
    uow.on_commit(move || enqueue_embedding(queue.as_ref(), post_id));
}

pub(crate) fn enqueue_embedding(queue: &dyn JobQueue<EmbedPostJob>, post_id: PostId) {
    match queue.enqueue(EmbedPostJob { post_id }) {
        Ok(()) => debug!(post_id = %post_id, "Embedding job enqueued"),
        Err(e) => error!(post_id = %post_id, error = %e, "Failed to enqueue embedding job"),
    }
}
