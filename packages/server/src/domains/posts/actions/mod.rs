//! Posts domain actions - entry-point business logic
//!
//! Called directly from the command line and the backfill binary.

pub mod create_post;
pub mod generate_embedding;
pub mod interactions;

pub use create_post::{create_post, insert_post};
pub use generate_embedding::{
    schedule_embedding, EmbedPostJob, EmbeddingFailure, EmbeddingOutcome, EmbeddingPipeline,
};
pub use interactions::{add_comment, flag_post, toggle_like, InteractionError, LikeToggle};
