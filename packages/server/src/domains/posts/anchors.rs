//! Process-wide category anchors.
//!
//! Each anchored [`Category`] has a reference vector produced by embedding its
//! description. The vectors are computed once, on first use, and then shared
//! read-only by every pipeline run and search.

use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::OnceCell;
use tracing::{info, instrument};

use super::categories::Category;
use crate::kernel::{BaseEmbeddingService, EmbeddingError};

/// Category → reference vector, always iterated in [`Category`] declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anchors {
    entries: Vec<(Category, Vec<f32>)>,
}

impl Anchors {
    /// Build from arbitrary-order entries. The first entry wins for duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = (Category, Vec<f32>)>) -> Self {
        let mut entries: Vec<_> = entries.into_iter().collect();
        entries.sort_by_key(|(category, _)| *category);
        entries.dedup_by_key(|(category, _)| *category);
        Self { entries }
    }

    pub fn get(&self, category: Category) -> Option<&[f32]> {
        self.entries
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[f32])> {
        self.entries.iter().map(|(c, v)| (*c, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lazily-initialized anchor set shared across the process.
///
/// Concurrent first callers wait on a single initialization. A failed
/// initialization leaves the cache empty so the next caller tries again.
#[derive(Debug, Default)]
pub struct AnchorCache {
    cell: OnceCell<Arc<Anchors>>,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache that starts out populated (tests, warm restarts).
    pub fn preloaded(anchors: Anchors) -> Self {
        Self {
            cell: OnceCell::new_with(Some(Arc::new(anchors))),
        }
    }

    /// Return the anchors, embedding all four descriptions on first use.
    pub async fn get_anchors(
        &self,
        embedder: &dyn BaseEmbeddingService,
    ) -> Result<Arc<Anchors>, EmbeddingError> {
        self.cell
            .get_or_try_init(|| compute_anchors(embedder))
            .await
            .map(Arc::clone)
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

#[instrument(skip(embedder))]
async fn compute_anchors(
    embedder: &dyn BaseEmbeddingService,
) -> Result<Arc<Anchors>, EmbeddingError> {
    let requests = Category::ANCHORED.into_iter().filter_map(|category| {
        category
            .anchor_description()
            .map(|description| async move {
                embedder
                    .generate(description)
                    .await
                    .map(|vector| (category, vector))
            })
    });

    let entries = try_join_all(requests).await?;
    info!(anchors = entries.len(), "category anchors initialized");

    Ok(Arc::new(Anchors::from_entries(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{MockEmbeddingService, MockFailure};
    use std::time::Duration;

    fn mock_with_anchors() -> MockEmbeddingService {
        MockEmbeddingService::new(2)
            .with_anchor(Category::QAndA, vec![0.0, 0.0])
            .with_anchor(Category::News, vec![10.0, 0.0])
            .with_anchor(Category::ConnectOs, vec![0.0, 10.0])
            .with_anchor(Category::Hardware, vec![10.0, 10.0])
    }

    #[test]
    fn test_entries_are_ordered_by_category_not_insertion() {
        let anchors = Anchors::from_entries(vec![
            (Category::Hardware, vec![3.0]),
            (Category::QAndA, vec![0.0]),
            (Category::ConnectOs, vec![2.0]),
            (Category::News, vec![1.0]),
        ]);

        let order: Vec<Category> = anchors.iter().map(|(c, _)| c).collect();
        assert_eq!(order, Category::ANCHORED.to_vec());
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let anchors = Anchors::from_entries(vec![
            (Category::News, vec![1.0]),
            (Category::News, vec![2.0]),
        ]);

        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors.get(Category::News), Some(&[1.0][..]));
    }

    #[tokio::test]
    async fn test_first_call_embeds_all_four_descriptions() {
        let embedder = mock_with_anchors();
        let cache = AnchorCache::new();

        let anchors = cache.get_anchors(&embedder).await.unwrap();

        assert_eq!(anchors.len(), 4);
        assert_eq!(anchors.get(Category::News), Some(&[10.0, 0.0][..]));
        assert_eq!(embedder.call_count(), 4);
        assert!(cache.is_initialized());
    }

    #[tokio::test]
    async fn test_later_calls_do_not_hit_the_network() {
        let embedder = mock_with_anchors();
        let cache = AnchorCache::new();

        let first = cache.get_anchors(&embedder).await.unwrap();
        let second = cache.get_anchors(&embedder).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(embedder.call_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_first_callers_initialize_once() {
        let embedder = Arc::new(mock_with_anchors().with_delay(Duration::from_millis(20)));
        let cache = Arc::new(AnchorCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let embedder = embedder.clone();
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_anchors(embedder.as_ref()).await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 4);
        }
        assert_eq!(embedder.call_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_initialization_is_retried_by_next_caller() {
        let embedder = mock_with_anchors().failing_first(1, MockFailure::Transient);
        let cache = AnchorCache::new();

        let err = cache.get_anchors(&embedder).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Transient(_)));
        assert!(!cache.is_initialized());

        let anchors = cache.get_anchors(&embedder).await.unwrap();
        assert_eq!(anchors.len(), 4);
        assert!(cache.is_initialized());
    }

    #[tokio::test]
    async fn test_preloaded_cache_never_embeds() {
        let embedder = mock_with_anchors();
        let cache = AnchorCache::preloaded(Anchors::from_entries(vec![(
            Category::News,
            vec![1.0, 1.0],
        )]));

        let anchors = cache.get_anchors(&embedder).await.unwrap();

        assert_eq!(anchors.len(), 1);
        assert_eq!(embedder.call_count(), 0);
    }
}
