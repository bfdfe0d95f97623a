//! gRPC Streaming Integration Tests
//!
//! Runs the assembled server on a loopback port and drives every call shape
//! through the caller API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tonic::transport::{Channel, Endpoint};
use tonic_reflection::pb::v1::{
    ServerReflectionRequest, server_reflection_client::ServerReflectionClient,
    server_reflection_request::MessageRequest, server_reflection_response::MessageResponse,
};

use stream_rpc::proto::calculator::v1::FindMaximumRequest;
use stream_rpc::{
    CalculatorSettings, CallTracker, GreeterSettings, InMemoryBlogStore, Person, RpcClient,
    RpcServer, RpcServerError, StatusCode,
};

struct TestServer {
    client: RpcClient,
    channel: Channel,
    tracker: Arc<CallTracker>,
    store: Arc<InMemoryBlogStore>,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), RpcServerError>>,
}

fn fast_greeter() -> GreeterSettings {
    GreeterSettings {
        stream_buffer: 4,
        interval: Duration::from_millis(5),
        repeat: 10,
        step_delay: Duration::from_millis(10),
    }
}

/// Start a server on a random port and connect a caller to it.
async fn setup_test_server(greeter: GreeterSettings) -> TestServer {
    let store = Arc::new(InMemoryBlogStore::new());
    let server = RpcServer::new(CalculatorSettings::default(), greeter, store.clone())
        .with_drain_timeout(Duration::from_secs(2));
    let tracker = server.tracker();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server.serve(listener, shutdown.clone()));

    let channel = Endpoint::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();

    TestServer {
        client: RpcClient::from_channel(channel.clone()),
        channel,
        tracker,
        store,
        shutdown,
        handle,
    }
}

async fn wait_for_idle(tracker: &CallTracker) {
    timeout(Duration::from_secs(5), async {
        while tracker.total_in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("calls still in flight");
}

// =============================================================================
// Calculator
// =============================================================================

#[tokio::test]
async fn test_sum() {
    let server = setup_test_server(fast_greeter()).await;
    assert_eq!(server.client.sum(3, 10).await.unwrap(), 13);
}

#[tokio::test]
async fn test_sum_overflow_is_invalid_argument() {
    let server = setup_test_server(fast_greeter()).await;
    let err = server.client.sum(i32::MAX, 1).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_square_root() {
    let server = setup_test_server(fast_greeter()).await;

    let root = server.client.square_root(10).await.unwrap();
    assert!((root - 10f64.sqrt()).abs() < 1e-12);

    let err = server.client.square_root(-2).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
    assert_eq!(err.to_string(), "Received a negative number: -2");
}

#[tokio::test]
async fn test_prime_number_decomposition() {
    let server = setup_test_server(fast_greeter()).await;

    let factors = server
        .client
        .prime_factors(124_538_982)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(factors, vec![2, 3, 617, 33641]);
}

#[tokio::test]
async fn test_prime_number_decomposition_rejects_non_positive() {
    let server = setup_test_server(fast_greeter()).await;

    let result = match server.client.prime_factors(0).await {
        Ok(sequence) => sequence.collect().await.map(|_| ()),
        Err(err) => Err(err),
    };
    assert_eq!(result.unwrap_err().code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_sequence_stays_ended() {
    let server = setup_test_server(fast_greeter()).await;

    let mut factors = server.client.prime_factors(12).await.unwrap();
    let mut seen = Vec::new();
    while let Some(factor) = factors.next().await.unwrap() {
        seen.push(factor);
    }
    assert_eq!(seen, vec![2, 2, 3]);
    assert!(factors.is_finished());
    assert_eq!(factors.next().await.unwrap(), None);
}

#[tokio::test]
async fn test_compute_average() {
    let server = setup_test_server(fast_greeter()).await;

    let average = server
        .client
        .compute_average(vec![3, 5, 9, 54, 23])
        .await
        .unwrap();
    assert!((average - 18.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_compute_average_of_nothing() {
    let server = setup_test_server(fast_greeter()).await;

    let err = server.client.compute_average(Vec::new()).await.unwrap_err();
    assert_eq!(err.code(), StatusCode::InvalidArgument);
}

#[tokio::test]
async fn test_find_maximum() {
    let server = setup_test_server(fast_greeter()).await;

    let maxima = server
        .client
        .find_maximum(vec![4, 7, 2, 19, 4, 6, 32])
        .await
        .unwrap();
    assert_eq!(maxima, vec![4, 7, 19, 32]);
}

#[tokio::test]
async fn test_find_maximum_paced() {
    let server = setup_test_server(fast_greeter()).await;
    let client = server.client.clone().with_pacing(Duration::from_millis(20));

    let maxima = client
        .find_maximum(vec![4, 7, 2, 19, 4, 6, 32])
        .await
        .unwrap();
    assert_eq!(maxima, vec![4, 7, 19, 32]);
}

#[tokio::test]
async fn test_find_maximum_interactive() {
    let server = setup_test_server(fast_greeter()).await;
    let mut session = server.client.open_find_maximum().await.unwrap();

    session.send(FindMaximumRequest { number: 5 }).await.unwrap();
    assert_eq!(session.receive().await.unwrap(), Some(5));

    session.send(FindMaximumRequest { number: 3 }).await.unwrap();
    session.send(FindMaximumRequest { number: 8 }).await.unwrap();
    assert_eq!(session.receive().await.unwrap(), Some(8));

    session.close_send();
    assert_eq!(session.receive().await.unwrap(), None);
}

// =============================================================================
// Greet
// =============================================================================

#[tokio::test]
async fn test_greet() {
    let server = setup_test_server(fast_greeter()).await;
    let reply = server
        .client
        .greet(&Person::new("Stephane", "Maarek"))
        .await
        .unwrap();
    assert_eq!(reply, "Hello Stephane");
}

#[tokio::test]
async fn test_greet_many_times() {
    let server = setup_test_server(fast_greeter()).await;

    let replies = server
        .client
        .greet_many_times(&Person::new("Ada", "Lovelace"))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let expected: Vec<String> = (0..10).map(|i| format!("Hello Ada number {i}")).collect();
    assert_eq!(replies, expected);
}

#[tokio::test]
async fn test_long_greet() {
    let server = setup_test_server(fast_greeter()).await;

    let people = [Person::new("A", "x"), Person::new("B", "y")];
    let reply = server.client.long_greet(&people).await.unwrap();
    assert_eq!(reply, "Hello A! Hello B! ");
}

#[tokio::test]
async fn test_greet_everyone() {
    let server = setup_test_server(fast_greeter()).await;

    let people = [
        Person::new("Stephane", "Maarek"),
        Person::new("John", "Doe"),
        Person::new("Lucy", "Smith"),
    ];
    let replies = server.client.greet_everyone(&people).await.unwrap();
    assert_eq!(
        replies,
        vec!["Hello Stephane! ", "Hello John! ", "Hello Lucy! "]
    );
}

// =============================================================================
// Deadlines
// =============================================================================

#[tokio::test]
async fn test_greet_with_deadline_in_time() {
    let server = setup_test_server(fast_greeter()).await;

    let reply = server
        .client
        .greet_with_deadline(&Person::new("Stephane", "Maarek"), Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(reply, "Hello Stephane");
}

#[tokio::test]
async fn test_greet_with_deadline_exceeded() {
    let slow = GreeterSettings {
        step_delay: Duration::from_millis(200),
        ..fast_greeter()
    };
    let server = setup_test_server(slow).await;

    let err = server
        .client
        .greet_with_deadline(&Person::new("Stephane", "Maarek"), Duration::from_millis(100))
        .await
        .unwrap_err();
    assert_eq!(err.code(), StatusCode::DeadlineExceeded);
    assert!(err.code().is_retryable());

    wait_for_idle(&server.tracker).await;
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_abandoned_stream_releases_call() {
    let slow = GreeterSettings {
        interval: Duration::from_millis(200),
        ..fast_greeter()
    };
    let server = setup_test_server(slow).await;

    let mut replies = server
        .client
        .greet_many_times(&Person::new("Ada", "Lovelace"))
        .await
        .unwrap();
    assert_eq!(
        replies.next().await.unwrap().as_deref(),
        Some("Hello Ada number 0")
    );
    assert!(server.tracker.total_in_flight() >= 1);

    replies.close();
    wait_for_idle(&server.tracker).await;

    let server_streaming = server
        .tracker
        .snapshot()
        .into_iter()
        .find(|s| s.shape == "server_streaming")
        .unwrap();
    assert_eq!(server_streaming.completed, 0);
    assert_eq!(server_streaming.failed, 1);
}

#[tokio::test]
async fn test_abandoned_factorization_releases_call() {
    let server = setup_test_server(fast_greeter()).await;

    // 2^61 - 1 is prime, so no factor arrives before the caller gives up.
    let factors = server
        .client
        .prime_factors(2_305_843_009_213_693_951)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.tracker.total_in_flight(), 1);

    factors.close();
    wait_for_idle(&server.tracker).await;

    let answer = timeout(Duration::from_secs(2), server.client.sum(20, 22))
        .await
        .expect("server stopped answering")
        .unwrap();
    assert_eq!(answer, 42);
}

#[tokio::test]
async fn test_completed_calls_are_counted() {
    let server = setup_test_server(fast_greeter()).await;

    server.client.sum(1, 2).await.unwrap();
    server.client.square_root(-1).await.unwrap_err();
    wait_for_idle(&server.tracker).await;

    let unary = server
        .tracker
        .snapshot()
        .into_iter()
        .find(|s| s.shape == "unary")
        .unwrap();
    assert_eq!(unary.completed, 1);
    assert_eq!(unary.failed, 1);
}

#[tokio::test]
async fn test_unary_timeout_applies_to_fast_calls() {
    let server = setup_test_server(fast_greeter()).await;
    let client = server.client.clone().with_timeout(Duration::from_secs(5));

    assert_eq!(client.sum(2, 3).await.unwrap(), 5);
    assert_eq!(
        client.square_root(-4).await.unwrap_err().code(),
        StatusCode::InvalidArgument
    );
}

// =============================================================================
// Reflection
// =============================================================================

#[tokio::test]
async fn test_reflection_lists_services() {
    let server = setup_test_server(fast_greeter()).await;
    let mut reflection = ServerReflectionClient::new(server.channel.clone());

    let request = ServerReflectionRequest {
        host: String::new(),
        message_request: Some(MessageRequest::ListServices(String::new())),
    };
    let mut responses = reflection
        .server_reflection_info(tokio_stream::iter(vec![request]))
        .await
        .unwrap()
        .into_inner();
    let response = responses.message().await.unwrap().unwrap();

    let list = match response.message_response {
        Some(MessageResponse::ListServicesResponse(list)) => list,
        other => panic!("unexpected reflection response: {other:?}"),
    };
    let names: Vec<String> = list.service.into_iter().map(|s| s.name).collect();
    for expected in [
        "greet.v1.GreetService",
        "calculator.v1.CalculatorService",
        "blog.v1.BlogService",
    ] {
        assert!(names.iter().any(|n| n == expected), "{expected} missing from {names:?}");
    }
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test]
async fn test_graceful_shutdown_closes_store() {
    let server = setup_test_server(fast_greeter()).await;
    server.client.sum(1, 1).await.unwrap();
    assert!(!server.store.is_closed());

    server.shutdown.cancel();
    timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .unwrap()
        .unwrap();

    assert!(server.store.is_closed());
}
