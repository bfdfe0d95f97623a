//! Blog use cases.
//!
//! Parse failures become `InvalidArgument`, empty lookups `NotFound`, and
//! store faults `Internal`.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;

use crate::application::ports::BlogStore;
use crate::domain::blog::{Blog, BlogDraft, BlogId};
use crate::domain::status::CallError;

/// Blog use cases over an injected store.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn BlogStore>,
}

impl std::fmt::Debug for BlogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogService").finish_non_exhaustive()
    }
}

impl BlogService {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Store a new blog.
    ///
    /// # Errors
    ///
    /// `Internal` on store failure.
    pub async fn create(&self, draft: BlogDraft) -> Result<Blog, CallError> {
        let id = self.store.insert(draft.clone()).await?;
        tracing::info!(blog_id = %id, "blog created");
        Ok(Blog::from_draft(id, draft))
    }

    /// Fetch a blog by its textual id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent,
    /// `Internal` on store failure.
    pub async fn read(&self, raw_id: &str) -> Result<Blog, CallError> {
        let id = BlogId::parse(raw_id, "blog_id")?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Replace the fields of an existing blog.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent,
    /// `Internal` on store failure.
    pub async fn update(&self, raw_id: &str, draft: BlogDraft) -> Result<Blog, CallError> {
        let id = BlogId::parse(raw_id, "blog.id")?;
        let blog = Blog::from_draft(id, draft);
        if self.store.replace(blog.clone()).await? {
            tracing::info!(blog_id = %id, "blog updated");
            Ok(blog)
        } else {
            Err(not_found(id))
        }
    }

    /// Delete a blog, returning its id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent,
    /// `Internal` on store failure.
    pub async fn delete(&self, raw_id: &str) -> Result<BlogId, CallError> {
        let id = BlogId::parse(raw_id, "blog_id")?;
        match self.store.delete(id).await? {
            0 => Err(not_found(id)),
            _ => {
                tracing::info!(blog_id = %id, "blog deleted");
                Ok(id)
            }
        }
    }

    /// Stream every stored blog.
    ///
    /// # Errors
    ///
    /// `Internal` when the store cannot start the listing. Faults while
    /// streaming arrive as `Internal` items.
    pub async fn list(&self) -> Result<BoxStream<'static, Result<Blog, CallError>>, CallError> {
        let blogs = self.store.find_all().await?;
        Ok(blogs.map(|item| item.map_err(CallError::from)).boxed())
    }
}

fn not_found(id: BlogId) -> CallError {
    CallError::not_found(format!("Cannot find blog with ID: {id}"))
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;
    use crate::application::ports::{MockBlogStore, StoreError};
    use crate::domain::status::StatusCode;

    fn draft() -> BlogDraft {
        BlogDraft {
            author_id: "author".into(),
            title: "title".into(),
            content: "content".into(),
        }
    }

    fn service(store: MockBlogStore) -> BlogService {
        BlogService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn create_returns_assigned_id() {
        let id = BlogId::generate();
        let mut store = MockBlogStore::new();
        store.expect_insert().times(1).returning(move |_| Ok(id));

        let blog = service(store).create(draft()).await.unwrap();
        assert_eq!(blog.id, id);
        assert_eq!(blog.title, "title");
    }

    #[tokio::test]
    async fn store_fault_is_internal() {
        let mut store = MockBlogStore::new();
        store
            .expect_insert()
            .returning(|_| Err(StoreError::Backend("disk full".into())));

        let err = service(store).create(draft()).await.unwrap_err();
        assert_eq!(err.code(), StatusCode::Internal);
        assert!(err.to_string().contains("disk full"));
    }

    #[tokio::test]
    async fn malformed_id_never_reaches_store() {
        let mut store = MockBlogStore::new();
        store.expect_find_by_id().never();

        let err = service(store).read("nope").await.unwrap_err();
        assert_eq!(err.code(), StatusCode::InvalidArgument);
    }

    #[tokio::test]
    async fn absent_blog_is_not_found() {
        let mut store = MockBlogStore::new();
        store.expect_find_by_id().returning(|_| Ok(None));
        store.expect_replace().returning(|_| Ok(false));
        store.expect_delete().returning(|_| Ok(0));
        let service = service(store);
        let id = BlogId::generate().to_string();

        assert_eq!(
            service.read(&id).await.unwrap_err().code(),
            StatusCode::NotFound
        );
        assert_eq!(
            service.update(&id, draft()).await.unwrap_err().code(),
            StatusCode::NotFound
        );
        assert_eq!(
            service.delete(&id).await.unwrap_err().code(),
            StatusCode::NotFound
        );
    }

    #[tokio::test]
    async fn update_names_the_nested_id_field() {
        let err = service(MockBlogStore::new())
            .update("bad", draft())
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { ref field, .. } if field == "blog.id"));
    }

    #[tokio::test]
    async fn list_maps_stream_faults() {
        let blog = Blog::from_draft(BlogId::generate(), draft());
        let mut store = MockBlogStore::new();
        store.expect_find_all().returning(move || {
            Ok(stream::iter(vec![Ok(blog.clone()), Err(StoreError::Closed)]).boxed())
        });

        let items: Vec<_> = service(store).list().await.unwrap().collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(items[1].as_ref().unwrap_err().code(), StatusCode::Internal);
    }
}
