//! Calculator gRPC Adapter

use std::sync::Arc;

use futures::StreamExt;
use tonic::{Request, Response, Status, Streaming};

use super::BoxedStream;
use super::proto::calculator::v1::{
    ComputeAverageRequest, ComputeAverageResponse, FindMaximumRequest, FindMaximumResponse,
    PrimeNumberDecompositionRequest, PrimeNumberDecompositionResponse, SquareRootRequest,
    SquareRootResponse, SumRequest, SumResponse,
    calculator_service_server::{CalculatorService as CalculatorRpc, CalculatorServiceServer},
};
use super::tracker::CallTracker;
use crate::application::services::CalculatorService;
use crate::domain::call::CallShape;

/// Serves `calculator.v1.CalculatorService`.
#[derive(Debug, Clone)]
pub struct CalculatorGrpc {
    service: CalculatorService,
    tracker: Arc<CallTracker>,
}

impl CalculatorGrpc {
    /// Create the adapter.
    #[must_use]
    pub const fn new(service: CalculatorService, tracker: Arc<CallTracker>) -> Self {
        Self { service, tracker }
    }

    /// Wrap into the generated tonic service.
    #[must_use]
    pub fn into_server(self) -> CalculatorServiceServer<Self> {
        CalculatorServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl CalculatorRpc for CalculatorGrpc {
    async fn sum(&self, request: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        let call = self.tracker.begin("CalculatorService/Sum", CallShape::Unary);
        let SumRequest {
            first_number,
            second_number,
        } = request.into_inner();
        tracing::debug!(first_number, second_number, "Sum");

        let sum_result = call.settle(self.service.sum(first_number, second_number))?;
        Ok(Response::new(SumResponse { sum_result }))
    }

    type PrimeNumberDecompositionStream = BoxedStream<PrimeNumberDecompositionResponse>;

    async fn prime_number_decomposition(
        &self,
        request: Request<PrimeNumberDecompositionRequest>,
    ) -> Result<Response<Self::PrimeNumberDecompositionStream>, Status> {
        let call = self.tracker.begin(
            "CalculatorService/PrimeNumberDecomposition",
            CallShape::ServerStreaming,
        );
        let number = request.into_inner().number;
        tracing::debug!(number, "PrimeNumberDecomposition");

        match self.service.prime_number_decomposition(number) {
            Ok(factors) => {
                let body = factors.map(|item| {
                    item.map(|prime_number| PrimeNumberDecompositionResponse { prime_number })
                });
                Ok(Response::new(call.stream(body)))
            }
            Err(err) => Err(call.fail(err)),
        }
    }

    async fn compute_average(
        &self,
        request: Request<Streaming<ComputeAverageRequest>>,
    ) -> Result<Response<ComputeAverageResponse>, Status> {
        let call = self
            .tracker
            .begin("CalculatorService/ComputeAverage", CallShape::ClientStreaming);
        let numbers = call.inbound(request.into_inner(), |req| req.number);

        let average = call.settle(self.service.compute_average(numbers).await)?;
        Ok(Response::new(ComputeAverageResponse { average }))
    }

    type FindMaximumStream = BoxedStream<FindMaximumResponse>;

    async fn find_maximum(
        &self,
        request: Request<Streaming<FindMaximumRequest>>,
    ) -> Result<Response<Self::FindMaximumStream>, Status> {
        let call = self
            .tracker
            .begin("CalculatorService/FindMaximum", CallShape::Bidirectional);
        let numbers = call.inbound(request.into_inner(), |req| req.number);

        let body = self
            .service
            .find_maximum(numbers)
            .map(|item| item.map(|maximum| FindMaximumResponse { maximum }));
        Ok(Response::new(call.stream(body)))
    }

    async fn square_root(
        &self,
        request: Request<SquareRootRequest>,
    ) -> Result<Response<SquareRootResponse>, Status> {
        let call = self
            .tracker
            .begin("CalculatorService/SquareRoot", CallShape::Unary);
        let number = request.into_inner().number;
        tracing::debug!(number, "SquareRoot");

        let number_root = call.settle(self.service.square_root(number))?;
        Ok(Response::new(SquareRootResponse { number_root }))
    }
}
