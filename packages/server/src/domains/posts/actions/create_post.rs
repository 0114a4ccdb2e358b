//! Post creation action
//!
//! Inserts the post and arranges for it to be embedded once the insert is
//! committed. The caller never waits on the embedding pipeline.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::info;

use crate::common::UserId;
use crate::domains::posts::actions::generate_embedding::{schedule_embedding, EmbedPostJob};
use crate::domains::posts::actions::interactions::{validate_content, InteractionError};
use crate::domains::posts::models::Post;
use crate::kernel::jobs::JobQueue;
use crate::kernel::unit_of_work::UnitOfWork;

/// Insert a post inside an existing unit of work.
///
/// The embedding job is only enqueued if `uow` later commits.
pub async fn insert_post(
    uow: &mut UnitOfWork,
    author_id: UserId,
    content: &str,
    embedding_jobs: Arc<dyn JobQueue<EmbedPostJob>>,
) -> Result<Post, InteractionError> {
    let content = validate_content(content)?;
    let post = Post::create(author_id, content, uow.conn()).await?;
    schedule_embedding(uow, embedding_jobs, post.id);
    Ok(post)
}

/// Create a post in its own transaction.
pub async fn create_post(
    author_id: UserId,
    content: &str,
    embedding_jobs: Arc<dyn JobQueue<EmbedPostJob>>,
    pool: &PgPool,
) -> Result<Post, InteractionError> {
    let mut uow = UnitOfWork::begin(pool).await?;
    let post = insert_post(&mut uow, author_id, content, embedding_jobs).await?;
    uow.commit().await?;

    info!(post_id = %post.id, author_id = %author_id, "Post created");
    Ok(post)
}
