//! gRPC Server Assembly
//!
//! Registers the three services, plus server reflection, on one tonic
//! server and owns the shutdown
//! sequence: stop accepting and drain in-flight calls, release the listener,
//! then shut the document store down.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tonic_reflection::pb::v1::server_reflection_server::{
    ServerReflection, ServerReflectionServer,
};

use super::tls::ServerTls;
use super::proto::FILE_DESCRIPTOR_SET;
use super::tracker::CallTracker;
use super::{BlogGrpc, CalculatorGrpc, GreetGrpc};
use crate::application::ports::{BlogStore, StoreError};
use crate::application::services::{
    BlogService, CalculatorService, CalculatorSettings, GreeterService, GreeterSettings,
};

/// Default time allowed for in-flight calls to finish after shutdown starts.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// gRPC server errors.
#[derive(Debug, thiserror::Error)]
pub enum RpcServerError {
    /// The transport failed to start or crashed.
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The reflection descriptor set could not be loaded.
    #[error("reflection setup failed: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    /// The document store failed to shut down.
    #[error("store shutdown failed: {0}")]
    Store(#[from] StoreError),
}

/// gRPC server reflection over the checked-in descriptor set.
///
/// # Errors
///
/// Returns an error if the descriptor set does not decode.
pub fn reflection_service()
-> Result<ServerReflectionServer<impl ServerReflection>, tonic_reflection::server::Error> {
    tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()
}

/// The assembled greet, calculator and blog services.
pub struct RpcServer {
    calculator: CalculatorGrpc,
    greet: GreetGrpc,
    blog: BlogGrpc,
    store: Arc<dyn BlogStore>,
    tracker: Arc<CallTracker>,
    tls: Option<ServerTls>,
    drain_timeout: Duration,
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("tls", &self.tls.is_some())
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

impl RpcServer {
    /// Assemble the services over `store`.
    #[must_use]
    pub fn new(
        calculator: CalculatorSettings,
        greeter: GreeterSettings,
        store: Arc<dyn BlogStore>,
    ) -> Self {
        let tracker = Arc::new(CallTracker::new());
        Self {
            calculator: CalculatorGrpc::new(
                CalculatorService::new(calculator),
                Arc::clone(&tracker),
            ),
            greet: GreetGrpc::new(GreeterService::new(greeter), Arc::clone(&tracker)),
            blog: BlogGrpc::new(BlogService::new(Arc::clone(&store)), Arc::clone(&tracker)),
            store,
            tracker,
            tls: None,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Serve over TLS with `identity`.
    #[must_use]
    pub fn with_tls(mut self, identity: ServerTls) -> Self {
        self.tls = Some(identity);
        self
    }

    /// Override the drain budget.
    #[must_use]
    pub const fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Shared call tracker (for the health endpoint and tests).
    #[must_use]
    pub fn tracker(&self) -> Arc<CallTracker> {
        Arc::clone(&self.tracker)
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// After cancellation no new connections are accepted; in-flight calls
    /// get up to the drain timeout to finish before they are dropped. The
    /// listener is released before the store is shut down.
    ///
    /// # Errors
    ///
    /// Returns `RpcServerError` if TLS setup or the transport fails, or the
    /// store cannot be shut down.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), RpcServerError> {
        let Self {
            calculator,
            greet,
            blog,
            store,
            tls,
            drain_timeout,
            ..
        } = self;

        let reflection = reflection_service()?;
        let mut builder = Server::builder();
        if let Some(identity) = &tls {
            builder = builder.tls_config(identity.server_config())?;
        }

        let local_addr = listener.local_addr().ok();
        tracing::info!(addr = ?local_addr, tls = tls.is_some(), "gRPC server listening");

        {
            let serving = builder
                .add_service(calculator.into_server())
                .add_service(greet.into_server())
                .add_service(blog.into_server())
                .add_service(reflection)
                .serve_with_incoming_shutdown(
                    TcpListenerStream::new(listener),
                    shutdown.clone().cancelled_owned(),
                );
            tokio::pin!(serving);

            let drain_expired = async {
                shutdown.cancelled().await;
                tokio::time::sleep(drain_timeout).await;
            };

            tokio::select! {
                result = &mut serving => {
                    result?;
                    tracing::info!("gRPC server drained");
                }
                () = drain_expired => {
                    tracing::warn!(
                        timeout_secs = drain_timeout.as_secs(),
                        "drain timeout elapsed, dropping remaining calls"
                    );
                }
            }
        }
        tracing::info!("gRPC listener released");

        store.shutdown().await?;
        tracing::info!("Document store shut down");
        Ok(())
    }
}
