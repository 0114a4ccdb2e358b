//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use forum_core::common::UserId;
use forum_core::config::DEFAULT_EMBEDDING_DIMENSIONS;
use forum_core::domains::posts::models::Post;
use forum_core::domains::users::User;
use sqlx::PgPool;

/// Create a user with a unique suffix on `name`
pub async fn create_test_user(pool: &PgPool, name: &str, is_moderator: bool) -> Result<User> {
    let username = format!("{}_{}", name, uuid::Uuid::new_v4().simple());
    User::create(&username, is_moderator, pool).await
}

/// Insert a post directly, bypassing the embedding trigger
pub async fn create_test_post(pool: &PgPool, author_id: UserId, content: &str) -> Result<Post> {
    let mut conn = pool.acquire().await?;
    Post::create(author_id, content, &mut conn).await
}

/// Schema-width vector with the given leading coordinates, zero elsewhere
pub fn padded_vector(leading: &[f32]) -> Vec<f32> {
    let mut vector = vec![0.0; DEFAULT_EMBEDDING_DIMENSIONS];
    vector[..leading.len()].copy_from_slice(leading);
    vector
}
