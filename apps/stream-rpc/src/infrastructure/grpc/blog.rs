//! Blog gRPC Adapter

use std::sync::Arc;

use futures::StreamExt;
use tonic::{Request, Response, Status};

use super::BoxedStream;
use super::proto::blog::v1::{
    self as proto, CreateBlogRequest, CreateBlogResponse, DeleteBlogRequest, DeleteBlogResponse,
    ListBlogRequest, ListBlogResponse, ReadBlogRequest, ReadBlogResponse, UpdateBlogRequest,
    UpdateBlogResponse,
    blog_service_server::{BlogService as BlogRpc, BlogServiceServer},
};
use super::tracker::CallTracker;
use crate::application::services::BlogService;
use crate::domain::blog::{Blog, BlogDraft};
use crate::domain::call::CallShape;
use crate::domain::status::CallError;

/// Serves `blog.v1.BlogService`.
#[derive(Debug, Clone)]
pub struct BlogGrpc {
    service: BlogService,
    tracker: Arc<CallTracker>,
}

impl BlogGrpc {
    /// Create the adapter.
    #[must_use]
    pub const fn new(service: BlogService, tracker: Arc<CallTracker>) -> Self {
        Self { service, tracker }
    }

    /// Wrap into the generated tonic service.
    #[must_use]
    pub fn into_server(self) -> BlogServiceServer<Self> {
        BlogServiceServer::new(self)
    }
}

fn to_proto(blog: Blog) -> proto::Blog {
    proto::Blog {
        id: blog.id.to_string(),
        author_id: blog.author_id,
        title: blog.title,
        content: blog.content,
    }
}

/// Split a request blog into its raw id and the draft fields.
fn from_proto(blog: Option<proto::Blog>) -> Result<(String, BlogDraft), CallError> {
    let blog = blog.ok_or_else(|| CallError::invalid_argument("blog", "blog is required"))?;
    Ok((
        blog.id,
        BlogDraft {
            author_id: blog.author_id,
            title: blog.title,
            content: blog.content,
        },
    ))
}

#[tonic::async_trait]
impl BlogRpc for BlogGrpc {
    async fn create_blog(
        &self,
        request: Request<CreateBlogRequest>,
    ) -> Result<Response<CreateBlogResponse>, Status> {
        let call = self.tracker.begin("BlogService/CreateBlog", CallShape::Unary);
        let result = match from_proto(request.into_inner().blog) {
            Ok((_, draft)) => self.service.create(draft).await,
            Err(err) => Err(err),
        };

        let blog = call.settle(result)?;
        Ok(Response::new(CreateBlogResponse {
            blog: Some(to_proto(blog)),
        }))
    }

    async fn read_blog(
        &self,
        request: Request<ReadBlogRequest>,
    ) -> Result<Response<ReadBlogResponse>, Status> {
        let call = self.tracker.begin("BlogService/ReadBlog", CallShape::Unary);
        let blog_id = request.into_inner().blog_id;

        let blog = call.settle(self.service.read(&blog_id).await)?;
        Ok(Response::new(ReadBlogResponse {
            blog: Some(to_proto(blog)),
        }))
    }

    async fn update_blog(
        &self,
        request: Request<UpdateBlogRequest>,
    ) -> Result<Response<UpdateBlogResponse>, Status> {
        let call = self.tracker.begin("BlogService/UpdateBlog", CallShape::Unary);
        let result = match from_proto(request.into_inner().blog) {
            Ok((id, draft)) => self.service.update(&id, draft).await,
            Err(err) => Err(err),
        };

        let blog = call.settle(result)?;
        Ok(Response::new(UpdateBlogResponse {
            blog: Some(to_proto(blog)),
        }))
    }

    async fn delete_blog(
        &self,
        request: Request<DeleteBlogRequest>,
    ) -> Result<Response<DeleteBlogResponse>, Status> {
        let call = self.tracker.begin("BlogService/DeleteBlog", CallShape::Unary);
        let blog_id = request.into_inner().blog_id;

        let id = call.settle(self.service.delete(&blog_id).await)?;
        Ok(Response::new(DeleteBlogResponse {
            blog_id: id.to_string(),
        }))
    }

    type ListBlogStream = BoxedStream<ListBlogResponse>;

    async fn list_blog(
        &self,
        _request: Request<ListBlogRequest>,
    ) -> Result<Response<Self::ListBlogStream>, Status> {
        let call = self
            .tracker
            .begin("BlogService/ListBlog", CallShape::ServerStreaming);

        match self.service.list().await {
            Ok(blogs) => {
                let body = blogs.map(|item| {
                    item.map(|blog| ListBlogResponse {
                        blog: Some(to_proto(blog)),
                    })
                });
                Ok(Response::new(call.stream(body)))
            }
            Err(err) => Err(call.fail(err)),
        }
    }
}
