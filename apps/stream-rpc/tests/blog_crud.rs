//! Blog CRUD Integration Tests
//!
//! Exercises the blog service end to end against the in-memory store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::Endpoint;

use stream_rpc::application::ports::BlogStream;
use stream_rpc::{
    Blog, BlogDraft, BlogId, BlogStore, CalculatorSettings, CallError, GreeterSettings,
    InMemoryBlogStore, RpcClient, RpcServer, StatusCode, StoreError,
};

/// Store whose reads take longer than a short caller deadline.
struct SlowStore {
    inner: InMemoryBlogStore,
    delay: Duration,
}

#[async_trait]
impl BlogStore for SlowStore {
    async fn insert(&self, draft: BlogDraft) -> Result<BlogId, StoreError> {
        self.inner.insert(draft).await
    }

    async fn find_by_id(&self, id: BlogId) -> Result<Option<Blog>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_id(id).await
    }

    async fn replace(&self, blog: Blog) -> Result<bool, StoreError> {
        self.inner.replace(blog).await
    }

    async fn delete(&self, id: BlogId) -> Result<u64, StoreError> {
        self.inner.delete(id).await
    }

    async fn find_all(&self) -> Result<BlogStream, StoreError> {
        self.inner.find_all().await
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        self.inner.shutdown().await
    }
}

async fn setup_test_server() -> (RpcClient, Arc<InMemoryBlogStore>) {
    let store = Arc::new(InMemoryBlogStore::new());
    let client = serve(store.clone()).await;
    (client, store)
}

async fn serve(store: Arc<dyn BlogStore>) -> RpcClient {
    let server = RpcServer::new(
        CalculatorSettings::default(),
        GreeterSettings::default(),
        store,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener, tokio_util::sync::CancellationToken::new()));

    let channel = Endpoint::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();
    RpcClient::from_channel(channel)
}

fn draft(title: &str) -> BlogDraft {
    BlogDraft {
        author_id: "Stephane".to_string(),
        title: title.to_string(),
        content: format!("Content of {title}"),
    }
}

async fn list_all(client: &RpcClient) -> Vec<String> {
    let items = client.list_blogs().await.unwrap().collect().await.unwrap();
    items
        .into_iter()
        .map(|item: Result<_, CallError>| item.unwrap().title)
        .collect()
}

#[tokio::test]
async fn test_create_then_read() {
    let (client, _store) = setup_test_server().await;

    let created = client.create_blog(draft("My First Blog")).await.unwrap();
    let read = client.read_blog(&created.id.to_string()).await.unwrap();

    assert_eq!(read, created);
    assert_eq!(read.author_id, "Stephane");
    assert_eq!(read.title, "My First Blog");
    assert_eq!(read.content, "Content of My First Blog");
}

#[tokio::test]
async fn test_read_malformed_id() {
    let (client, _store) = setup_test_server().await;

    let err = client.read_blog("aasdfasdf").await.unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
    assert!(matches!(err, CallError::InvalidArgument { ref field, .. } if field == "blog_id"));
}

#[tokio::test]
async fn test_read_absent_id() {
    let (client, _store) = setup_test_server().await;

    let absent = BlogId::generate().to_string();
    let err = client.read_blog(&absent).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
    assert_eq!(err.to_string(), format!("Cannot find blog with ID: {absent}"));
}

#[tokio::test]
async fn test_update_replaces_fields() {
    let (client, _store) = setup_test_server().await;

    let created = client.create_blog(draft("Before")).await.unwrap();
    let id = created.id.to_string();

    let updated = client
        .update_blog(
            &id,
            BlogDraft {
                author_id: "Changed Author".to_string(),
                title: "After".to_string(),
                content: "New content".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);

    let read = client.read_blog(&id).await.unwrap();
    assert_eq!(read.author_id, "Changed Author");
    assert_eq!(read.title, "After");
    assert_eq!(read.content, "New content");
}

#[tokio::test]
async fn test_update_absent_blog() {
    let (client, _store) = setup_test_server().await;

    let err = client
        .update_blog(&BlogId::generate().to_string(), draft("Ghost"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);

    let err = client.update_blog("nope", draft("Ghost")).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_delete_twice() {
    let (client, _store) = setup_test_server().await;

    let created = client.create_blog(draft("Short-lived")).await.unwrap();
    let id = created.id.to_string();

    assert_eq!(client.delete_blog(&id).await.unwrap(), id);

    let err = client.delete_blog(&id).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);

    let err = client.read_blog(&id).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::NotFound);
}

#[tokio::test]
async fn test_list_in_insertion_order() {
    let (client, _store) = setup_test_server().await;
    assert!(list_all(&client).await.is_empty());

    for title in ["one", "two", "three"] {
        client.create_blog(draft(title)).await.unwrap();
    }
    assert_eq!(list_all(&client).await, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn test_closed_store_is_internal() {
    let (client, store) = setup_test_server().await;
    store.shutdown().await.unwrap();

    let err = client.create_blog(draft("Too late")).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::Internal);
    assert!(!err.code().is_expected());
}

#[tokio::test]
async fn test_read_past_deadline() {
    let client = serve(Arc::new(SlowStore {
        inner: InMemoryBlogStore::new(),
        delay: Duration::from_millis(500),
    }))
    .await;

    let created = client.create_blog(draft("Slow")).await.unwrap();
    let id = created.id.to_string();

    let err = client
        .clone()
        .with_timeout(Duration::from_millis(100))
        .read_blog(&id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::DeadlineExceeded);

    let read = client
        .with_timeout(Duration::from_secs(5))
        .read_blog(&id)
        .await
        .unwrap();
    assert_eq!(read, created);
}
