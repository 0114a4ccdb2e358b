//! Likes, comments and moderation flags
//!
//! Permission checks run before anything touches the database.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::common::PostId;
use crate::domains::posts::models::{Comment, Like, Post};
use crate::domains::users::User;

#[derive(Debug, thiserror::Error)]
pub enum InteractionError {
    #[error("{0}")]
    ConstraintViolation(String),

    #[error("post not found")]
    PostNotFound,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// What `toggle_like` did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeToggle {
    Liked,
    Unliked,
}

/// Trimmed content, or a violation if nothing is left
pub fn validate_content(content: &str) -> Result<&str, InteractionError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(InteractionError::ConstraintViolation(
            "Content must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}

pub fn ensure_moderator(actor: &User) -> Result<(), InteractionError> {
    if !actor.is_moderator {
        return Err(InteractionError::ConstraintViolation(format!(
            "{} is not allowed to flag posts",
            actor.username
        )));
    }
    Ok(())
}

pub fn ensure_not_own_post(actor: &User, post: &Post) -> Result<(), InteractionError> {
    if post.author_id == actor.id {
        return Err(InteractionError::ConstraintViolation(
            "You cannot like your own post".to_string(),
        ));
    }
    Ok(())
}

async fn load_post(post_id: PostId, pool: &PgPool) -> Result<Post, InteractionError> {
    Post::find_by_id(post_id, pool)
        .await?
        .ok_or(InteractionError::PostNotFound)
}

/// Like the post, or remove the actor's existing like.
pub async fn toggle_like(
    post_id: PostId,
    actor: &User,
    pool: &PgPool,
) -> Result<LikeToggle, InteractionError> {
    let post = load_post(post_id, pool).await?;
    ensure_not_own_post(actor, &post)?;

    if Like::delete(post_id, actor.id, pool).await? {
        info!(post_id = %post_id, user_id = %actor.id, "Post unliked");
        return Ok(LikeToggle::Unliked);
    }

    Like::create(post_id, actor.id, pool).await?;
    info!(post_id = %post_id, user_id = %actor.id, "Post liked");
    Ok(LikeToggle::Liked)
}

/// Mark or unmark a post as misleading. Moderators only.
pub async fn flag_post(
    post_id: PostId,
    actor: &User,
    is_misleading: bool,
    pool: &PgPool,
) -> Result<Post, InteractionError> {
    ensure_moderator(actor)?;
    load_post(post_id, pool).await?;

    let post = Post::set_misleading(post_id, is_misleading, pool).await?;
    info!(
        post_id = %post_id,
        moderator_id = %actor.id,
        is_misleading,
        "Post flag updated"
    );
    Ok(post)
}

pub async fn add_comment(
    post_id: PostId,
    actor: &User,
    content: &str,
    pool: &PgPool,
) -> Result<Comment, InteractionError> {
    let content = validate_content(content)?;
    load_post(post_id, pool).await?;

    let comment = Comment::create(post_id, actor.id, content, pool).await?;
    info!(post_id = %post_id, comment_id = %comment.id, "Comment added");
    Ok(comment)
}
