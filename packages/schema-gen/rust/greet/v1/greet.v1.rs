// @generated
// This file is @generated by prost-build.
/// Name of the person being greeted.
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct Greeting {
    #[prost(string, tag="1")]
    pub first_name: ::prost::alloc::string::String,
    #[prost(string, tag="2")]
    pub last_name: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetRequest {
    #[prost(message, optional, tag="1")]
    pub greeting: ::core::option::Option<Greeting>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetResponse {
    #[prost(string, tag="1")]
    pub result: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetManyTimesRequest {
    #[prost(message, optional, tag="1")]
    pub greeting: ::core::option::Option<Greeting>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetManyTimesResponse {
    #[prost(string, tag="1")]
    pub result: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct LongGreetRequest {
    #[prost(message, optional, tag="1")]
    pub greeting: ::core::option::Option<Greeting>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct LongGreetResponse {
    #[prost(string, tag="1")]
    pub result: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetEveryoneRequest {
    #[prost(message, optional, tag="1")]
    pub greeting: ::core::option::Option<Greeting>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetEveryoneResponse {
    #[prost(string, tag="1")]
    pub result: ::prost::alloc::string::String,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetWithDeadlineRequest {
    #[prost(message, optional, tag="1")]
    pub greeting: ::core::option::Option<Greeting>,
}
#[derive(Clone, PartialEq, Eq, Hash, ::prost::Message)]
pub struct GreetWithDeadlineResponse {
    #[prost(string, tag="1")]
    pub result: ::prost::alloc::string::String,
}
include!("greet.v1.tonic.rs");
// @@protoc_insertion_point(module)
