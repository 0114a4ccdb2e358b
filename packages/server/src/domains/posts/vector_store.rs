use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use super::categories::Category;
use super::models::Post;
use crate::common::PostId;

/// Restriction applied to nearest-neighbor candidates beyond "has an embedding".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub category: Option<Category>,
}

impl CandidateFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        post.embedding.is_some()
            && match self.category {
                Some(category) => post.category() == Some(category),
                None => true,
            }
    }
}

/// The slice of post storage the embedding pipeline and search depend on.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>>;

    /// Persist embedding and category together; never one without the other.
    async fn update_embedding_and_category(
        &self,
        id: PostId,
        embedding: &[f32],
        category: Category,
    ) -> Result<()>;

    /// Embedded posts matching `filter`, by ascending Euclidean distance then id.
    async fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &CandidateFilter,
        limit: usize,
    ) -> Result<Vec<Post>>;
}

/// Postgres + pgvector backed store
#[derive(Clone)]
pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Post::find_by_id(id, &self.pool).await
    }

    #[instrument(skip(self, embedding), fields(dimensions = embedding.len()))]
    async fn update_embedding_and_category(
        &self,
        id: PostId,
        embedding: &[f32],
        category: Category,
    ) -> Result<()> {
        Post::update_embedding_and_category(id, embedding, category, &self.pool).await
    }

    #[instrument(skip(self, query))]
    async fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &CandidateFilter,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Post::find_nearest(query, filter.category, limit, &self.pool).await
    }
}
