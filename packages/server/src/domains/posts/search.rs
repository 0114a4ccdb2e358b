//! Semantic search over embedded posts

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domains::posts::categories::Category;
use crate::domains::posts::models::Post;
use crate::domains::posts::vector_store::{CandidateFilter, VectorStore};
use crate::kernel::{BaseEmbeddingService, EmbeddingError};

/// Category filter value meaning "no restriction"
pub const ALL_CATEGORIES: &str = "All";

/// Upper bound on results per query
pub const MAX_SEARCH_RESULTS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search query must not be empty")]
    EmptyQuery,

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("failed to embed search query: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("failed to query posts: {0}")]
    Store(#[source] anyhow::Error),
}

impl SearchError {
    /// Caller mistakes, as opposed to backend failures
    pub fn is_invalid_query(&self) -> bool {
        matches!(self, SearchError::EmptyQuery | SearchError::UnknownCategory(_))
    }
}

/// Resolve a user-supplied filter. `None`, blank and "All" mean every category.
pub fn parse_category_filter(filter: Option<&str>) -> Result<CandidateFilter, SearchError> {
    let Some(raw) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(CandidateFilter::any());
    };

    if raw.eq_ignore_ascii_case(ALL_CATEGORIES) {
        return Ok(CandidateFilter::any());
    }

    raw.parse::<Category>()
        .map(CandidateFilter::category)
        .map_err(|_| SearchError::UnknownCategory(raw.to_string()))
}

/// Clamp a requested limit to `[1, MAX_SEARCH_RESULTS]`
pub fn effective_limit(requested: Option<usize>, default_limit: usize) -> usize {
    requested
        .unwrap_or(default_limit)
        .clamp(1, MAX_SEARCH_RESULTS)
}

/// Ranks embedded posts by distance to an embedded query.
#[derive(Clone)]
pub struct SearchService {
    embedder: Arc<dyn BaseEmbeddingService>,
    store: Arc<dyn VectorStore>,
    default_limit: usize,
}

impl SearchService {
    pub fn new(
        embedder: Arc<dyn BaseEmbeddingService>,
        store: Arc<dyn VectorStore>,
        default_limit: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            default_limit,
        }
    }

    /// Search posts by semantic similarity.
    ///
    /// Only posts that already have an embedding are candidates. Results are
    /// ordered by ascending Euclidean distance, then by id.
    #[instrument(skip(self, query_text), fields(query_len = query_text.len()))]
    pub async fn search(
        &self,
        query_text: &str,
        category_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Post>, SearchError> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let filter = parse_category_filter(category_filter)?;
        let limit = effective_limit(limit, self.default_limit);

        let query_vector = self.embedder.generate(query_text).await.map_err(|e| {
            warn!(kind = e.kind(), error = %e, "Failed to embed search query");
            SearchError::Embedding(e)
        })?;

        let posts = self
            .store
            .nearest_neighbors(&query_vector, &filter, limit)
            .await
            .map_err(SearchError::Store)?;

        debug!(
            category = ?filter.category,
            limit,
            results = posts.len(),
            "Search completed"
        );
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PostId, UserId};
    use crate::kernel::test_dependencies::{InMemoryVectorStore, MockEmbeddingService, MockFailure};
    use chrono::Utc;

    const QUERY: &str = "rack-mounted barcode scanners";

    fn embedded_post(id: i64, category: Category, embedding: Vec<f32>) -> Post {
        Post {
            id: PostId::from_i64(id),
            author_id: UserId::from_i64(1),
            content: format!("post {}", id),
            created_at: Utc::now(),
            is_misleading: false,
            embedding: Some(pgvector::Vector::from(embedding)),
            category: Some(category.to_string()),
        }
    }

    fn unembedded_post(id: i64) -> Post {
        Post {
            embedding: None,
            category: None,
            ..embedded_post(id, Category::News, vec![0.0, 0.0])
        }
    }

    /// Posts {A, A, B, B, C} = {Hardware, Hardware, News, News, Q&A}
    fn seeded_store() -> Arc<InMemoryVectorStore> {
        let store = Arc::new(InMemoryVectorStore::new());
        store.insert(embedded_post(1, Category::Hardware, vec![3.0, 0.0]));
        store.insert(embedded_post(2, Category::Hardware, vec![1.0, 0.0]));
        store.insert(embedded_post(3, Category::News, vec![0.5, 0.0]));
        store.insert(embedded_post(4, Category::News, vec![2.0, 0.0]));
        store.insert(embedded_post(5, Category::QAndA, vec![0.1, 0.0]));
        store.insert(unembedded_post(6));
        store
    }

    fn service(store: Arc<InMemoryVectorStore>, embedder: MockEmbeddingService) -> SearchService {
        SearchService::new(Arc::new(embedder), store, 2)
    }

    fn embedder() -> MockEmbeddingService {
        MockEmbeddingService::new(2).with_embedding(QUERY, vec![0.0, 0.0])
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|p| p.id.into_i64()).collect()
    }

    #[tokio::test]
    async fn test_category_filter_returns_only_that_category_ranked() {
        let search = service(seeded_store(), embedder());

        let results = search.search(QUERY, Some("Hardware"), Some(10)).await.unwrap();

        assert_eq!(ids(&results), vec![2, 1]);
        assert!(results.iter().all(|p| p.category() == Some(Category::Hardware)));
    }

    #[tokio::test]
    async fn test_results_never_exceed_limit() {
        let search = service(seeded_store(), embedder());

        let results = search.search(QUERY, Some("News"), Some(1)).await.unwrap();

        assert_eq!(ids(&results), vec![3]);
    }

    #[tokio::test]
    async fn test_all_searches_every_embedded_post() {
        let search = service(seeded_store(), embedder());

        let results = search.search(QUERY, Some("All"), Some(50)).await.unwrap();

        assert_eq!(ids(&results), vec![5, 3, 2, 4, 1]);
    }

    #[tokio::test]
    async fn test_default_limit_applies_when_none_requested() {
        let search = service(seeded_store(), embedder());

        let results = search.search(QUERY, None, None).await.unwrap();

        assert_eq!(ids(&results), vec![5, 3]);
    }

    #[tokio::test]
    async fn test_ties_are_broken_by_ascending_id() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.insert(embedded_post(9, Category::News, vec![1.0, 0.0]));
        store.insert(embedded_post(4, Category::News, vec![0.0, 1.0]));
        store.insert(embedded_post(7, Category::News, vec![-1.0, 0.0]));
        let search = service(store, embedder());

        let results = search.search(QUERY, None, Some(3)).await.unwrap();

        assert_eq!(ids(&results), vec![4, 7, 9]);
    }

    #[tokio::test]
    async fn test_unknown_category_is_invalid_query() {
        let embedder = Arc::new(embedder());
        let search = SearchService::new(embedder.clone(), seeded_store(), 2);

        let err = search.search(QUERY, Some("Gardening"), None).await.unwrap_err();

        assert!(matches!(err, SearchError::UnknownCategory(ref c) if c == "Gardening"));
        assert!(err.is_invalid_query());
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_embedding() {
        let embedder = Arc::new(embedder());
        let search = SearchService::new(embedder.clone(), seeded_store(), 2);

        let err = search.search("   ", None, None).await.unwrap_err();

        assert!(matches!(err, SearchError::EmptyQuery));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_reported() {
        let search = service(seeded_store(), embedder().failing(MockFailure::Configuration));

        let err = search.search(QUERY, None, None).await.unwrap_err();

        match err {
            SearchError::Embedding(e) => assert!(e.is_configuration()),
            other => panic!("expected embedding error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_category_filter() {
        assert_eq!(parse_category_filter(None).unwrap(), CandidateFilter::any());
        assert_eq!(parse_category_filter(Some("")).unwrap(), CandidateFilter::any());
        assert_eq!(parse_category_filter(Some("all")).unwrap(), CandidateFilter::any());
        assert_eq!(
            parse_category_filter(Some("Q&A")).unwrap(),
            CandidateFilter::category(Category::QAndA)
        );
        assert!(parse_category_filter(Some("Uncategorised")).is_err());
    }

    #[test]
    fn test_effective_limit_clamps() {
        assert_eq!(effective_limit(None, 2), 2);
        assert_eq!(effective_limit(Some(0), 2), 1);
        assert_eq!(effective_limit(Some(7), 2), 7);
        assert_eq!(effective_limit(Some(500), 2), MAX_SEARCH_RESULTS);
    }
}
