// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerKernel for tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BaseEmbeddingService, EmbeddingError};
use crate::common::{euclidean_distance, PostId};
use crate::domains::posts::categories::Category;
use crate::domains::posts::models::Post;
use crate::domains::posts::vector_store::{CandidateFilter, VectorStore};

// =============================================================================
// Mock Embedding Service
// =============================================================================

/// Error a mock should produce when told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Configuration,
    Transient,
    DataIntegrity,
}

impl MockFailure {
    fn to_error(self) -> EmbeddingError {
        match self {
            MockFailure::Configuration => {
                EmbeddingError::Configuration("GOOGLE_API_KEY is not set".into())
            }
            MockFailure::Transient => EmbeddingError::Transient("mock network failure".into()),
            MockFailure::DataIntegrity => {
                EmbeddingError::DataIntegrity("mock malformed response".into())
            }
        }
    }
}

/// Deterministic embedding service.
///
/// Texts registered with [`with_embedding`](Self::with_embedding) return their
/// vector; anything else gets a stable hash-derived vector.
pub struct MockEmbeddingService {
    dimensions: usize,
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failure: Option<MockFailure>,
    failures_remaining: Mutex<usize>,
    delay: Option<Duration>,
}

impl MockEmbeddingService {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            embeddings: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
            failures_remaining: Mutex::new(0),
            delay: None,
        }
    }

    /// Return `embedding` whenever `text` is embedded
    pub fn with_embedding(self, text: &str, embedding: Vec<f32>) -> Self {
        self.embeddings
            .lock()
            .unwrap()
            .insert(text.to_string(), embedding);
        self
    }

    /// Pin the anchor vector for a category
    pub fn with_anchor(self, category: Category, embedding: Vec<f32>) -> Self {
        match category.anchor_description() {
            Some(description) => self.with_embedding(description, embedding),
            None => self,
        }
    }

    /// Fail every call
    pub fn failing(self, failure: MockFailure) -> Self {
        self.failing_first(usize::MAX, failure)
    }

    /// Fail the next `times` calls, then behave normally
    pub fn failing_first(mut self, times: usize, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        *self.failures_remaining.lock().unwrap() = times;
        self
    }

    /// Sleep before answering (to widen race windows)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every text passed to `generate`, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn should_fail(&self) -> Option<EmbeddingError> {
        let failure = self.failure?;
        let mut remaining = self.failures_remaining.lock().unwrap();
        if *remaining == 0 {
            return None;
        }
        if *remaining != usize::MAX {
            *remaining -= 1;
        }
        Some(failure.to_error())
    }
}

/// Stable pseudo-embedding derived from the text
pub fn hashed_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    (0..dimensions)
        .map(|i| {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            (hasher.finish() % 2000) as f32 / 1000.0 - 1.0
        })
        .collect()
}

#[async_trait]
impl BaseEmbeddingService for MockEmbeddingService {
    async fn generate(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.lock().unwrap().push(text.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.should_fail() {
            return Err(err);
        }

        let fixed = self.embeddings.lock().unwrap().get(text).cloned();
        Ok(fixed.unwrap_or_else(|| hashed_embedding(text, self.dimensions)))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// =============================================================================
// In-Memory Vector Store
// =============================================================================

/// Vector store over a map, with the same ranking rules as the pgvector store
#[derive(Default)]
pub struct InMemoryVectorStore {
    posts: Mutex<BTreeMap<PostId, Post>>,
    writes: Mutex<Vec<PostId>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, post: Post) {
        self.posts.lock().unwrap().insert(post.id, post);
    }

    pub fn get(&self, id: PostId) -> Option<Post> {
        self.posts.lock().unwrap().get(&id).cloned()
    }

    /// Number of embedding writes recorded for a post
    pub fn write_count(&self, id: PostId) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|written| **written == id)
            .count()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get_by_id(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.get(id))
    }

    async fn update_embedding_and_category(
        &self,
        id: PostId,
        embedding: &[f32],
        category: Category,
    ) -> Result<()> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Post {} not found", id))?;

        post.embedding = Some(pgvector::Vector::from(embedding.to_vec()));
        post.category = Some(category.to_string());
        self.writes.lock().unwrap().push(id);
        Ok(())
    }

    async fn nearest_neighbors(
        &self,
        query: &[f32],
        filter: &CandidateFilter,
        limit: usize,
    ) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();

        // BTreeMap iteration is by id, so the stable sort keeps id order on ties
        let mut ranked: Vec<(f32, Post)> = posts
            .values()
            .filter(|post| filter.matches(post))
            .filter_map(|post| {
                let distance = euclidean_distance(post.embedding_values()?, query);
                Some((distance, post.clone()))
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(_, post)| post)
            .collect())
    }
}
