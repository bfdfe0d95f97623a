//! Stream RPC Server Binary
//!
//! Serves the greet, calculator and blog services.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin stream-rpc
//! ```
//!
//! # Environment Variables
//!
//! - `STREAM_RPC_HOST`: bind host (default: 0.0.0.0)
//! - `STREAM_RPC_GRPC_PORT`: gRPC server port (default: 50051)
//! - `STREAM_RPC_HEALTH_PORT`: health and metrics HTTP port (default: 8083)
//! - `STREAM_RPC_TLS_CERT` / `STREAM_RPC_TLS_KEY`: PEM identity, both or neither
//! - `STREAM_RPC_STREAM_BUFFER`: outbound buffer per call (default: 16)
//! - `STREAM_RPC_GREET_INTERVAL_MS`: `GreetManyTimes` pacing (default: 1000)
//! - `STREAM_RPC_GREET_REPEAT`: `GreetManyTimes` item count (default: 10)
//! - `STREAM_RPC_DEADLINE_STEP_MS`: `GreetWithDeadline` step (default: 1000)
//! - `STREAM_RPC_FACTOR_BUDGET`: divisions per factorization slice (default: 10000)
//! - `STREAM_RPC_SHUTDOWN_TIMEOUT_SECS`: drain budget (default: 30)
//! - `OTEL_ENABLED`, `OTEL_EXPORTER_OTLP_ENDPOINT`, `OTEL_SERVICE_NAME`
//! - `RUST_LOG`: log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use stream_rpc::infrastructure::health::{HealthServer, HealthServerState};
use stream_rpc::infrastructure::telemetry;
use stream_rpc::{InMemoryBlogStore, RpcConfig, RpcServer, init_metrics};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "failed to install rustls crypto provider")?;

    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Stream RPC");

    let _metrics_handle = init_metrics();

    let config = RpcConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();
    let health_token = CancellationToken::new();

    let store = Arc::new(InMemoryBlogStore::new());
    let mut server = RpcServer::new(
        config.streams.calculator(),
        config.streams.greeter(),
        store,
    )
    .with_drain_timeout(config.server.shutdown_timeout);
    if let Some(identity) = config.tls.identity()? {
        server = server.with_tls(identity);
    }

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        server.tracker(),
        shutdown_token.clone(),
    ));
    let health_addr: SocketAddr = config.server.health_addr().parse()?;
    let health_server = HealthServer::new(health_addr, health_state, health_token.clone());
    let health_handle = tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    let listener = TcpListener::bind(config.server.grpc_addr()).await?;
    let grpc_handle = tokio::spawn(server.serve(listener, shutdown_token.clone()));

    tracing::info!("Stream RPC ready");

    await_shutdown(shutdown_token).await;

    match grpc_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "gRPC server error"),
        Err(e) => tracing::error!(error = %e, "gRPC server task failed"),
    }

    health_token.cancel();
    let _ = health_handle.await;

    tracing::info!("Stream RPC stopped");
    Ok(())
}

/// Load .env from the current directory or the nearest ancestor that has one.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        for dir in cwd.ancestors().skip(1) {
            let env_path = dir.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
        }
    }
}

fn log_config(config: &RpcConfig) {
    tracing::info!(
        grpc_addr = %config.server.grpc_addr(),
        health_addr = %config.server.health_addr(),
        tls = config.tls.cert_path.is_some(),
        shutdown_timeout_secs = config.server.shutdown_timeout.as_secs(),
        "Configuration loaded"
    );
    tracing::debug!(
        stream_buffer = config.streams.stream_buffer,
        greet_interval_ms = config.streams.greet_interval.as_millis(),
        greet_repeat = config.streams.greet_repeat,
        deadline_step_ms = config.streams.deadline_step.as_millis(),
        factor_budget = config.streams.factor_budget,
        "Stream settings"
    );
}

/// Wait for SIGTERM or SIGINT, then cancel `shutdown_token`.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
    tracing::info!("Graceful shutdown started");
}
