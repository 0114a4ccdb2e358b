// Forum Core - API Core
//
// This crate provides the forum backend: posts, comments, likes and moderation,
// with posts embedded and categorized in the background and searchable by
// semantic similarity.
//
// Business logic is organized per-domain in domains/*/actions/

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
