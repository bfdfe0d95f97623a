//! Blog Store Port
//!
//! Persistence abstraction for blogs. Implemented by adapters in the
//! infrastructure layer and handed to the blog use cases explicitly.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::blog::{Blog, BlogDraft, BlogId};
use crate::domain::status::CallError;

/// Document store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store has been shut down.
    #[error("store is closed")]
    Closed,

    /// The backend failed to carry out the operation.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for CallError {
    fn from(err: StoreError) -> Self {
        Self::internal(format!("Internal error: {err}"))
    }
}

/// Stream of stored blogs, in insertion order.
pub type BlogStream = BoxStream<'static, Result<Blog, StoreError>>;

/// Document store holding blogs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Insert a new blog and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    async fn insert(&self, draft: BlogDraft) -> Result<BlogId, StoreError>;

    /// Look a blog up by id.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails. An absent blog is `Ok(None)`.
    async fn find_by_id(&self, id: BlogId) -> Result<Option<Blog>, StoreError>;

    /// Replace the stored fields of `blog.id`. Returns `false` when no blog
    /// with that id exists.
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    async fn replace(&self, blog: Blog) -> Result<bool, StoreError>;

    /// Delete by id, returning the number of removed blogs (0 or 1).
    ///
    /// # Errors
    ///
    /// Returns error if the write fails.
    async fn delete(&self, id: BlogId) -> Result<u64, StoreError>;

    /// Stream every stored blog.
    ///
    /// # Errors
    ///
    /// Returns error if the query cannot be started.
    async fn find_all(&self) -> Result<BlogStream, StoreError>;

    /// Release the store. Every later call fails with [`StoreError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns error if releasing backend resources fails.
    async fn shutdown(&self) -> Result<(), StoreError>;
}
