use anyhow::Result;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::{to_pg_vector, PostId, UserId};
use crate::domains::posts::categories::Category;

/// Forum post. Content is immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_misleading: bool,

    // Written together by the embedding pipeline, NULL until then
    #[serde(skip)]
    pub embedding: Option<Vector>,
    pub category: Option<String>,
}

/// Post with author name and engagement counts, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostSummary {
    pub id: PostId,
    pub author_id: UserId,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_misleading: bool,
    pub category: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
}

impl Post {
    pub fn embedding_values(&self) -> Option<&[f32]> {
        self.embedding.as_ref().map(|v| v.as_slice())
    }

    /// Parsed category; unknown labels read as `None`.
    pub fn category(&self) -> Option<Category> {
        self.category.as_deref().and_then(|c| c.parse().ok())
    }

    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some() && self.category.is_some()
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Post {
    pub async fn find_by_id(id: PostId, pool: &PgPool) -> Result<Option<Self>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(post)
    }

    /// Insert a post on the caller's connection (usually an open transaction).
    pub async fn create(author_id: UserId, content: &str, conn: &mut PgConnection) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (author_id, content)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(author_id)
        .bind(content)
        .fetch_one(conn)
        .await?;
        Ok(post)
    }

    /// Newest first, with author and engagement counts
    pub async fn list_recent(limit: i64, offset: i64, pool: &PgPool) -> Result<Vec<PostSummary>> {
        let posts = sqlx::query_as::<_, PostSummary>(
            r#"
            SELECT
                p.id,
                p.author_id,
                u.username AS author_username,
                p.content,
                p.created_at,
                p.is_misleading,
                p.category,
                (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
                (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
            FROM posts p
            JOIN users u ON u.id = p.author_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Posts the pipeline never finished (for backfill)
    pub async fn find_without_embedding(pool: &PgPool) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE embedding IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    /// Write embedding and category in one statement.
    pub async fn update_embedding_and_category(
        id: PostId,
        embedding: &[f32],
        category: Category,
        pool: &PgPool,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE posts SET embedding = $2, category = $3 WHERE id = $1")
            .bind(id)
            .bind(to_pg_vector(embedding))
            .bind(category.as_str())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Post {} not found", id);
        }

        Ok(())
    }

    /// Embedded posts ordered by L2 distance to `embedding`, ties by id.
    pub async fn find_nearest(
        embedding: &[f32],
        category: Option<Category>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT *
            FROM posts
            WHERE embedding IS NOT NULL
              AND ($2::text IS NULL OR category = $2)
            ORDER BY embedding <-> $1, id
            LIMIT $3
            "#,
        )
        .bind(to_pg_vector(embedding))
        .bind(category.map(|c| c.as_str()))
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(posts)
    }

    pub async fn set_misleading(id: PostId, is_misleading: bool, pool: &PgPool) -> Result<Self> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET is_misleading = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(is_misleading)
        .fetch_one(pool)
        .await?;
        Ok(post)
    }
}
