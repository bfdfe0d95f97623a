//! Stream RPC Demo Caller
//!
//! Runs every operation of the three services once against a server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin stream-rpc-client
//! ```
//!
//! # Environment Variables
//!
//! - `STREAM_RPC_SERVER_URL`: target (default: <http://localhost:50051>)
//! - `STREAM_RPC_CA_CERT`: PEM trust anchor; enables TLS
//! - `STREAM_RPC_TLS_DOMAIN`: server name to verify (default: localhost)
//! - `STREAM_RPC_CLIENT_PACING_MS`: delay between sent items (default: 1000)

use std::time::Duration;

use anyhow::{Context, anyhow};
use stream_rpc::infrastructure::telemetry;
use stream_rpc::proto::greet::v1::GreetEveryoneRequest;
use stream_rpc::{BlogDraft, BlogId, CallError, ClientSettings, Person, RpcClient, TelemetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("failed to install rustls crypto provider"))?;

    let _ = dotenvy::dotenv();
    let _telemetry_guard = telemetry::init_with_config(
        TelemetryConfig::from_env().with_service_name("stream-rpc-client"),
    );

    let settings = ClientSettings::from_env();
    let tls = settings.tls().context("loading TLS trust settings")?;
    let client = RpcClient::connect(settings.server_url.clone(), tls.as_ref())
        .await
        .with_context(|| format!("connecting to {}", settings.server_url))?
        .with_pacing(settings.pacing);

    tracing::info!(url = %settings.server_url, tls = tls.is_some(), "Connected");

    calculator(&client).await?;
    greet(&client).await?;
    blog(&client).await?;

    tracing::info!("Demo finished");
    Ok(())
}

/// Reduce a call outcome: expected rejections are logged and skipped,
/// anything else aborts the run.
fn outcome<T>(operation: &'static str, result: Result<T, CallError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.code().is_expected() => {
            tracing::warn!(operation, code = %err.code(), message = %err, "Call rejected");
            Ok(None)
        }
        Err(err) if err.code().is_retryable() => {
            tracing::warn!(
                operation,
                message = %err,
                "Deadline exceeded, retry with a longer deadline"
            );
            Ok(None)
        }
        Err(err) => Err(anyhow!("{operation} failed with {}: {err}", err.code())),
    }
}

async fn calculator(client: &RpcClient) -> anyhow::Result<()> {
    if let Some(sum) = outcome("Sum", client.sum(3, 10).await)? {
        tracing::info!(sum, "Sum of 3 and 10");
    }

    for number in [10, -2] {
        if let Some(root) = outcome("SquareRoot", client.square_root(number).await)? {
            tracing::info!(number, root, "Square root");
        }
    }

    if let Some(mut factors) = outcome(
        "PrimeNumberDecomposition",
        client.prime_factors(124_538_982).await,
    )? {
        while let Some(factor) = outcome("PrimeNumberDecomposition", factors.next().await)?.flatten()
        {
            tracing::info!(factor, "Prime factor");
        }
    }

    if let Some(average) = outcome(
        "ComputeAverage",
        client.compute_average(vec![1, 2, 3, 4]).await,
    )? {
        tracing::info!(average, "Average");
    }

    if let Some(maxima) = outcome(
        "FindMaximum",
        client.find_maximum(vec![4, 7, 2, 19, 4, 6, 32]).await,
    )? {
        tracing::info!(?maxima, "Running maxima");
    }
    Ok(())
}

async fn greet(client: &RpcClient) -> anyhow::Result<()> {
    let people = [
        Person::new("Stephane", "Maarek"),
        Person::new("John", "Doe"),
        Person::new("Lucy", "Smith"),
        Person::new("Mark", "Twain"),
    ];

    if let Some(reply) = outcome("Greet", client.greet(&people[0]).await)? {
        tracing::info!(%reply, "Greet");
    }

    if let Some(mut replies) = outcome("GreetManyTimes", client.greet_many_times(&people[0]).await)?
    {
        while let Some(reply) = outcome("GreetManyTimes", replies.next().await)?.flatten() {
            tracing::info!(%reply, "GreetManyTimes");
        }
    }

    if let Some(reply) = outcome("LongGreet", client.long_greet(&people).await)? {
        tracing::info!(%reply, "LongGreet");
    }

    if let Some(session) = outcome("GreetEveryone", client.open_greet_everyone().await)? {
        let (sender, mut replies) = session.split();
        let requests: Vec<GreetEveryoneRequest> = people
            .iter()
            .map(|person| GreetEveryoneRequest {
                greeting: Some(person.into()),
            })
            .collect();
        let pacing = client.pacing();

        // Dropping the sender at the end closes the request side.
        let send_loop = tokio::spawn(async move {
            for request in requests {
                sender.send(request).await?;
                tokio::time::sleep(pacing).await;
            }
            Ok::<(), CallError>(())
        });

        while let Some(reply) = outcome("GreetEveryone", replies.next().await)?.flatten() {
            tracing::info!(%reply, "GreetEveryone");
        }
        let sent = send_loop.await.context("GreetEveryone send loop panicked")?;
        outcome("GreetEveryone", sent)?;
    }

    for deadline in [Duration::from_secs(5), Duration::from_secs(1)] {
        if let Some(reply) = outcome(
            "GreetWithDeadline",
            client.greet_with_deadline(&people[0], deadline).await,
        )? {
            tracing::info!(%reply, deadline_ms = deadline.as_millis(), "GreetWithDeadline");
        }
    }
    Ok(())
}

async fn blog(client: &RpcClient) -> anyhow::Result<()> {
    let draft = BlogDraft {
        author_id: "Stephane".to_string(),
        title: "My First Blog".to_string(),
        content: "Content of the first blog".to_string(),
    };
    let Some(created) = outcome("CreateBlog", client.create_blog(draft).await)? else {
        return Ok(());
    };
    let id = created.id.to_string();
    tracing::info!(%id, "Blog created");

    if let Some(blog) = outcome("ReadBlog", client.read_blog(&id).await)? {
        tracing::info!(id = %blog.id, title = %blog.title, "Blog read");
    }
    outcome("ReadBlog", client.read_blog("aasdfasdf").await)?;
    outcome(
        "ReadBlog",
        client.read_blog(&BlogId::generate().to_string()).await,
    )?;

    let revision = BlogDraft {
        author_id: "Changed Author".to_string(),
        title: "My First Blog (edited)".to_string(),
        content: "Content of the first blog, with some awesome additions!".to_string(),
    };
    if let Some(blog) = outcome("UpdateBlog", client.update_blog(&id, revision).await)? {
        tracing::info!(id = %blog.id, author = %blog.author_id, "Blog updated");
    }

    if let Some(mut blogs) = outcome("ListBlog", client.list_blogs().await)? {
        while let Some(item) = outcome("ListBlog", blogs.next().await)?.flatten() {
            if let Some(blog) = outcome("ListBlog", item)? {
                tracing::info!(id = %blog.id, title = %blog.title, "Listed blog");
            }
        }
    }

    if let Some(deleted) = outcome("DeleteBlog", client.delete_blog(&id).await)? {
        tracing::info!(id = %deleted, "Blog deleted");
    }
    outcome("DeleteBlog", client.delete_blog(&id).await)?;
    Ok(())
}
