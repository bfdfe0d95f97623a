//! Greet gRPC Adapter

use std::sync::Arc;

use futures::StreamExt;
use tonic::{Request, Response, Status, Streaming};

use super::BoxedStream;
use super::deadline;
use super::proto::greet::v1::{
    GreetEveryoneRequest, GreetEveryoneResponse, GreetManyTimesRequest, GreetManyTimesResponse,
    GreetRequest, GreetResponse, GreetWithDeadlineRequest, GreetWithDeadlineResponse, Greeting,
    LongGreetRequest, LongGreetResponse,
    greet_service_server::{GreetService, GreetServiceServer},
};
use super::tracker::CallTracker;
use crate::application::services::GreeterService;
use crate::domain::call::CallShape;
use crate::domain::greeting::Person;

/// Serves `greet.v1.GreetService`.
#[derive(Debug, Clone)]
pub struct GreetGrpc {
    service: GreeterService,
    tracker: Arc<CallTracker>,
}

impl GreetGrpc {
    /// Create the adapter.
    #[must_use]
    pub const fn new(service: GreeterService, tracker: Arc<CallTracker>) -> Self {
        Self { service, tracker }
    }

    /// Wrap into the generated tonic service.
    #[must_use]
    pub fn into_server(self) -> GreetServiceServer<Self> {
        GreetServiceServer::new(self)
    }
}

impl From<&Person> for Greeting {
    fn from(person: &Person) -> Self {
        Self {
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
        }
    }
}

fn person(greeting: Option<Greeting>) -> Person {
    let Greeting {
        first_name,
        last_name,
    } = greeting.unwrap_or_default();
    Person {
        first_name,
        last_name,
    }
}

#[tonic::async_trait]
impl GreetService for GreetGrpc {
    async fn greet(
        &self,
        request: Request<GreetRequest>,
    ) -> Result<Response<GreetResponse>, Status> {
        let call = self.tracker.begin("GreetService/Greet", CallShape::Unary);
        let person = person(request.into_inner().greeting);

        let result = call.settle(Ok(self.service.greet(&person)))?;
        Ok(Response::new(GreetResponse { result }))
    }

    type GreetManyTimesStream = BoxedStream<GreetManyTimesResponse>;

    async fn greet_many_times(
        &self,
        request: Request<GreetManyTimesRequest>,
    ) -> Result<Response<Self::GreetManyTimesStream>, Status> {
        let call = self
            .tracker
            .begin("GreetService/GreetManyTimes", CallShape::ServerStreaming);
        let person = person(request.into_inner().greeting);

        let body = self
            .service
            .greet_many_times(person)
            .map(|item| item.map(|result| GreetManyTimesResponse { result }));
        Ok(Response::new(call.stream(body)))
    }

    async fn long_greet(
        &self,
        request: Request<Streaming<LongGreetRequest>>,
    ) -> Result<Response<LongGreetResponse>, Status> {
        let call = self
            .tracker
            .begin("GreetService/LongGreet", CallShape::ClientStreaming);
        let people = call.inbound(request.into_inner(), |req| person(req.greeting));

        let result = call.settle(self.service.long_greet(people).await)?;
        Ok(Response::new(LongGreetResponse { result }))
    }

    type GreetEveryoneStream = BoxedStream<GreetEveryoneResponse>;

    async fn greet_everyone(
        &self,
        request: Request<Streaming<GreetEveryoneRequest>>,
    ) -> Result<Response<Self::GreetEveryoneStream>, Status> {
        let call = self
            .tracker
            .begin("GreetService/GreetEveryone", CallShape::Bidirectional);
        let people = call.inbound(request.into_inner(), |req| person(req.greeting));

        let body = self
            .service
            .greet_everyone(people)
            .map(|item| item.map(|result| GreetEveryoneResponse { result }));
        Ok(Response::new(call.stream(body)))
    }

    async fn greet_with_deadline(
        &self,
        request: Request<GreetWithDeadlineRequest>,
    ) -> Result<Response<GreetWithDeadlineResponse>, Status> {
        let call = self
            .tracker
            .begin("GreetService/GreetWithDeadline", CallShape::Unary);
        let deadline = deadline::from_metadata(request.metadata());
        let person = person(request.into_inner().greeting);
        tracing::debug!(
            remaining = ?deadline.map(|d| d.remaining()),
            "GreetWithDeadline"
        );

        let result = call.settle(self.service.greet_with_deadline(&person, deadline).await)?;
        Ok(Response::new(GreetWithDeadlineResponse { result }))
    }
}
