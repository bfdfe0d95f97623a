//! gRPC Transport Adapters
//!
//! Binds the application use cases to tonic. Each service adapter:
//!
//! 1. Opens a tracker slot for the call (shape, method, in-flight gauge)
//! 2. Converts protobuf messages into domain values
//! 3. Runs the use case, bridging inbound `Streaming<T>` and outbound
//!    channels to item sequences
//! 4. Classifies the outcome into a `tonic::Status`
//!
//! The caller side lives in [`client`].

pub mod blog;
pub mod calculator;
pub mod client;
pub mod deadline;
pub mod greet;
pub mod server;
pub mod status;
pub mod tls;
pub mod tracker;

use std::pin::Pin;

use tokio_stream::Stream;
use tonic::Status;

// Allow clippy warnings and missing docs in generated code
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    /// Encoded `FileDescriptorSet` of the three services, served over
    /// reflection.
    pub const FILE_DESCRIPTOR_SET: &[u8] = include_bytes!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../packages/schema-gen/rust/file_descriptor_set.bin"
    ));

    pub mod greet {
        pub mod v1 {
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/greet/v1/greet.v1.rs"
            ));
        }
    }
    pub mod calculator {
        pub mod v1 {
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/calculator/v1/calculator.v1.rs"
            ));
        }
    }
    pub mod blog {
        pub mod v1 {
            include!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../../packages/schema-gen/rust/blog/v1/blog.v1.rs"
            ));
        }
    }
}

/// Server-streaming response body shared by every adapter.
pub type BoxedStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send>>;

pub use blog::BlogGrpc;
pub use client::{ClientError, DuplexSender, DuplexSession, ResponseSequence, RpcClient};
pub use calculator::CalculatorGrpc;
pub use greet::GreetGrpc;
pub use server::{RpcServer, RpcServerError};
pub use tls::{ClientTls, ServerTls, TlsError};
pub use tracker::{CallGuard, CallTracker, ShapeStats};
