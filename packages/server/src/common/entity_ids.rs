//! Typed ID definitions for forum entities.
//!
//! ```rust
//! use forum_core::common::{PostId, UserId};
//!
//! let author: UserId = UserId::from_i64(1);
//! let post: PostId = PostId::from_i64(1);
//! assert_eq!(author.into_i64(), post.into_i64());
//! ```

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for forum users (authors, commenters, moderators).
pub struct User;

/// Marker type for posts.
pub struct Post;

/// Marker type for comments on a post.
pub struct Comment;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;

pub type PostId = Id<Post>;

pub type CommentId = Id<Comment>;
