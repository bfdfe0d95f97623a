//! In-memory blog store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use parking_lot::RwLock;

use crate::application::ports::{BlogStore, BlogStream, StoreError};
use crate::domain::blog::{Blog, BlogDraft, BlogId};

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    blog: Blog,
}

/// In-process implementation of `BlogStore`.
///
/// Listing returns blogs in insertion order. After [`BlogStore::shutdown`]
/// every operation fails with [`StoreError::Closed`].
#[derive(Debug, Default)]
pub struct InMemoryBlogStore {
    blogs: RwLock<HashMap<BlogId, Entry>>,
    next_seq: AtomicU64,
    closed: AtomicBool,
}

impl InMemoryBlogStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blogs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blogs.read().len()
    }

    /// Whether the store holds no blogs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blogs.read().is_empty()
    }

    /// Whether the store has been shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlogStore for InMemoryBlogStore {
    async fn insert(&self, draft: BlogDraft) -> Result<BlogId, StoreError> {
        self.ensure_open()?;
        let id = BlogId::generate();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.blogs.write().insert(
            id,
            Entry {
                seq,
                blog: Blog::from_draft(id, draft),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: BlogId) -> Result<Option<Blog>, StoreError> {
        self.ensure_open()?;
        Ok(self.blogs.read().get(&id).map(|entry| entry.blog.clone()))
    }

    async fn replace(&self, blog: Blog) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let mut blogs = self.blogs.write();
        match blogs.get_mut(&blog.id) {
            Some(entry) => {
                entry.blog = blog;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: BlogId) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(u64::from(self.blogs.write().remove(&id).is_some()))
    }

    async fn find_all(&self) -> Result<BlogStream, StoreError> {
        self.ensure_open()?;
        let mut entries: Vec<Entry> = self.blogs.read().values().cloned().collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(stream::iter(entries.into_iter().map(|entry| Ok(entry.blog))).boxed())
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(blogs = self.len(), "in-memory blog store closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str) -> BlogDraft {
        BlogDraft {
            author_id: "author".into(),
            title: title.into(),
            content: "content".into(),
        }
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemoryBlogStore::new();
        let id = store.insert(draft("first")).await.unwrap();

        let blog = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(blog.id, id);
        assert_eq!(blog.title, "first");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn replace_only_existing() {
        let store = InMemoryBlogStore::new();
        let id = store.insert(draft("old")).await.unwrap();

        assert!(store.replace(Blog::from_draft(id, draft("new"))).await.unwrap());
        assert_eq!(store.find_by_id(id).await.unwrap().unwrap().title, "new");

        let stranger = Blog::from_draft(BlogId::generate(), draft("x"));
        assert!(!store.replace(stranger).await.unwrap());
    }

    #[tokio::test]
    async fn delete_reports_count() {
        let store = InMemoryBlogStore::new();
        let id = store.insert(draft("gone")).await.unwrap();
        assert_eq!(store.delete(id).await.unwrap(), 1);
        assert_eq!(store.delete(id).await.unwrap(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let store = InMemoryBlogStore::new();
        for title in ["a", "b", "c", "d"] {
            store.insert(draft(title)).await.unwrap();
        }

        let titles: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .map(|blog| blog.unwrap().title)
            .collect()
            .await;
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn closed_store_rejects_everything() {
        let store = InMemoryBlogStore::new();
        let id = store.insert(draft("x")).await.unwrap();
        store.shutdown().await.unwrap();
        store.shutdown().await.unwrap();

        assert!(store.is_closed());
        assert_eq!(store.find_by_id(id).await, Err(StoreError::Closed));
        assert_eq!(store.insert(draft("y")).await, Err(StoreError::Closed));
        assert_eq!(store.delete(id).await, Err(StoreError::Closed));
        assert!(store.find_all().await.is_err());
    }
}
