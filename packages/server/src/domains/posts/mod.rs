pub mod actions;
pub mod anchors;
pub mod categories;
pub mod categorize;
pub mod models;
pub mod search;
pub mod vector_store;

pub use actions::{EmbedPostJob, EmbeddingOutcome, EmbeddingPipeline};
pub use anchors::{AnchorCache, Anchors};
pub use categories::Category;
pub use categorize::classify;
pub use models::{Comment, Like, Post, PostSummary};
pub use search::{SearchError, SearchService, ALL_CATEGORIES, MAX_SEARCH_RESULTS};
pub use vector_store::{CandidateFilter, PgVectorStore, VectorStore};
