// @generated
// This file is @generated by prost-build.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Blog {
    #[prost(string, tag="1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub author_id: ::prost::alloc::string::String,
    #[prost(string, tag="3")]
    pub title: ::prost::alloc::string::String,
    #[prost(string, tag="4")]
    pub content: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CreateBlogRequest {
    /// id is ignored
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct CreateBlogResponse {
    /// carries the generated id
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ReadBlogRequest {
    #[prost(string, tag="1")]
    pub blog_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ReadBlogResponse {
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct UpdateBlogRequest {
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct UpdateBlogResponse {
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct DeleteBlogRequest {
    #[prost(string, tag="1")]
    pub blog_id: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct DeleteBlogResponse {
    #[prost(string, tag="1")]
    pub blog_id: ::prost::alloc::string::String,
}
#[derive(Clone, Copy, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ListBlogRequest {
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct ListBlogResponse {
    #[prost(message, optional, tag="1")]
    pub blog: ::core::option::Option<Blog>,
}
include!("blog.v1.tonic.rs");
// @@protoc_insertion_point(module)
