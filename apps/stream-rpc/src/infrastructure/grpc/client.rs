//! gRPC Callers
//!
//! Caller-side session handling on top of the generated clients:
//!
//! - [`ResponseSequence`]: pull-based receive over a response stream that
//!   never yields again once it has ended or failed
//! - [`DuplexSession`]: independent send and receive halves of a
//!   bidirectional call, with an explicit `close_send`
//! - [`call_with_deadline`]: unary calls that resolve `DeadlineExceeded` on
//!   time even when the callee ignores the deadline
//!
//! Every failure reaching the caller is reduced to a [`CallError`].

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status, Streaming};

use super::proto::blog::v1::{
    self as blog_proto, CreateBlogRequest, DeleteBlogRequest, ListBlogRequest, ListBlogResponse,
    ReadBlogRequest, UpdateBlogRequest, blog_service_client::BlogServiceClient,
};
use super::proto::calculator::v1::{
    ComputeAverageRequest, FindMaximumRequest, FindMaximumResponse,
    PrimeNumberDecompositionRequest, PrimeNumberDecompositionResponse, SquareRootRequest,
    SumRequest, calculator_service_client::CalculatorServiceClient,
};
use super::proto::greet::v1::{
    GreetEveryoneRequest, GreetEveryoneResponse, GreetManyTimesRequest, GreetManyTimesResponse,
    GreetRequest, GreetWithDeadlineRequest, Greeting, LongGreetRequest,
    greet_service_client::GreetServiceClient,
};
use super::tls::{ClientTls, TlsError};
use crate::domain::blog::{Blog, BlogDraft, BlogId};
use crate::domain::greeting::Person;
use crate::domain::status::CallError;

/// Buffer between a caller's send loop and the transport.
const SEND_BUFFER: usize = 16;

/// Connection errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The endpoint could not be built or connected.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// TLS material could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),
}

// =============================================================================
// Sessions
// =============================================================================

/// Pull-based view of a response stream.
pub struct ResponseSequence<M, T> {
    inner: Option<Streaming<M>>,
    convert: fn(M) -> T,
}

impl<M, T> ResponseSequence<M, T> {
    /// Wrap a response stream.
    pub fn new(inner: Streaming<M>, convert: fn(M) -> T) -> Self {
        Self {
            inner: Some(inner),
            convert,
        }
    }

    /// Whether the sequence has ended or failed.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.inner.is_none()
    }

    /// Wait for the next item. `Ok(None)` marks end-of-sequence and is
    /// returned for every call after the sequence ended or failed.
    ///
    /// # Errors
    ///
    /// Returns the call's terminal status when the callee ends it with an
    /// error.
    pub async fn next(&mut self) -> Result<Option<T>, CallError> {
        let Some(stream) = self.inner.as_mut() else {
            return Ok(None);
        };
        match stream.message().await {
            Ok(Some(message)) => Ok(Some((self.convert)(message))),
            Ok(None) => {
                self.inner = None;
                Ok(None)
            }
            Err(status) => {
                self.inner = None;
                Err(CallError::from(status))
            }
        }
    }

    /// Drain the rest of the sequence.
    ///
    /// # Errors
    ///
    /// Returns the call's terminal status on failure.
    pub async fn collect(mut self) -> Result<Vec<T>, CallError> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Abandon the call. The callee observes the cancellation and stops
    /// producing.
    pub fn close(mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("response sequence closed before end");
        }
    }
}

/// Send half of a bidirectional call.
#[derive(Debug)]
pub struct DuplexSender<Req> {
    tx: Option<mpsc::Sender<Req>>,
}

impl<Req: Send> DuplexSender<Req> {
    /// Send one request item, waiting while the buffer is full.
    ///
    /// # Errors
    ///
    /// `Canceled` if the call already ended, `Internal` after `close_send`.
    pub async fn send(&self, item: Req) -> Result<(), CallError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| CallError::internal("send after close_send"))?;
        tx.send(item)
            .await
            .map_err(|_| CallError::Canceled("call closed before send".to_string()))
    }

    /// Signal end-of-input. Idempotent.
    pub fn close_send(&mut self) {
        self.tx = None;
    }
}

/// Both halves of an open bidirectional call.
pub struct DuplexSession<Req, M, T> {
    sender: DuplexSender<Req>,
    responses: ResponseSequence<M, T>,
}

impl<Req: Send, M, T> DuplexSession<Req, M, T> {
    /// Send one request item.
    ///
    /// # Errors
    ///
    /// See [`DuplexSender::send`].
    pub async fn send(&self, item: Req) -> Result<(), CallError> {
        self.sender.send(item).await
    }

    /// Signal end-of-input.
    pub fn close_send(&mut self) {
        self.sender.close_send();
    }

    /// Wait for the next response item.
    ///
    /// # Errors
    ///
    /// See [`ResponseSequence::next`].
    pub async fn receive(&mut self) -> Result<Option<T>, CallError> {
        self.responses.next().await
    }

    /// Separate the halves so they can progress in different tasks.
    pub fn split(self) -> (DuplexSender<Req>, ResponseSequence<M, T>) {
        (self.sender, self.responses)
    }
}

/// Open a bidirectional call with `open` and wrap it in a session.
async fn open_duplex<Req, M, T, F, Fut>(
    open: F,
    convert: fn(M) -> T,
) -> Result<DuplexSession<Req, M, T>, CallError>
where
    Req: Send + 'static,
    F: FnOnce(ReceiverStream<Req>) -> Fut,
    Fut: Future<Output = Result<Response<Streaming<M>>, Status>>,
{
    let (tx, rx) = mpsc::channel(SEND_BUFFER);
    let responses = open(ReceiverStream::new(rx)).await?.into_inner();
    Ok(DuplexSession {
        sender: DuplexSender { tx: Some(tx) },
        responses: ResponseSequence::new(responses, convert),
    })
}

/// Run a caller send loop in its own task: one item per `pacing`, then
/// close-send by dropping the sender.
fn spawn_send_loop<Req>(
    sender: DuplexSender<Req>,
    items: Vec<Req>,
    pacing: Duration,
) -> JoinHandle<Result<(), CallError>>
where
    Req: Send + 'static,
{
    tokio::spawn(async move {
        let mut sender = sender;
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 && !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
            sender.send(item).await?;
        }
        sender.close_send();
        Ok(())
    })
}

/// Stream `items` as a client-streaming request body.
fn paced_body<Req>(items: Vec<Req>, pacing: Duration) -> ReceiverStream<Req>
where
    Req: Send + 'static,
{
    let (tx, rx) = mpsc::channel(SEND_BUFFER);
    drop(spawn_send_loop(DuplexSender { tx: Some(tx) }, items, pacing));
    ReceiverStream::new(rx)
}

async fn join_send_loop(handle: JoinHandle<Result<(), CallError>>) -> Result<(), CallError> {
    handle
        .await
        .map_err(|e| CallError::internal(format!("send loop failed: {e}")))?
}

/// Attach `timeout` to a request so the callee learns the deadline.
pub fn with_deadline<T>(message: T, timeout: Duration) -> Request<T> {
    let mut request = Request::new(message);
    request.set_timeout(timeout);
    request
}

/// Await a unary call, resolving `DeadlineExceeded` once `timeout` elapses.
///
/// A `Cancelled` status that arrives after the deadline is the transport's
/// report of the same expiry and is reported as `DeadlineExceeded` too.
///
/// # Errors
///
/// `DeadlineExceeded` on expiry, otherwise the classified call status.
pub async fn call_with_deadline<T, F>(timeout: Duration, call: F) -> Result<T, CallError>
where
    F: Future<Output = Result<Response<T>, Status>>,
{
    let started = Instant::now();
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(response)) => Ok(response.into_inner()),
        Ok(Err(status))
            if status.code() == tonic::Code::Cancelled && started.elapsed() >= timeout =>
        {
            Err(deadline_exceeded(timeout))
        }
        Ok(Err(status)) => Err(CallError::from(status)),
        Err(_) => Err(deadline_exceeded(timeout)),
    }
}

fn deadline_exceeded(timeout: Duration) -> CallError {
    CallError::DeadlineExceeded(format!("deadline of {}ms exceeded", timeout.as_millis()))
}

// =============================================================================
// Typed callers
// =============================================================================

fn greeting(person: &Person) -> Option<Greeting> {
    Some(Greeting::from(person))
}

fn blog_from_proto(blog: blog_proto::Blog) -> Result<Blog, CallError> {
    Ok(Blog {
        id: BlogId::parse(&blog.id, "blog.id")?,
        author_id: blog.author_id,
        title: blog.title,
        content: blog.content,
    })
}

fn required_blog(blog: Option<blog_proto::Blog>) -> Result<Blog, CallError> {
    blog_from_proto(blog.ok_or_else(|| CallError::internal("response carried no blog"))?)
}

fn listed_blog(response: ListBlogResponse) -> Result<Blog, CallError> {
    required_blog(response.blog)
}

/// Caller for every service over one shared channel.
#[derive(Debug, Clone)]
pub struct RpcClient {
    channel: Channel,
    pacing: Duration,
    timeout: Option<Duration>,
}

impl RpcClient {
    /// Connect to `url`, optionally over TLS.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the endpoint is invalid or unreachable.
    pub async fn connect(
        url: impl Into<String>,
        tls: Option<&ClientTls>,
    ) -> Result<Self, ClientError> {
        let mut endpoint = Endpoint::from_shared(url.into())?;
        if let Some(tls) = tls {
            endpoint = endpoint.tls_config(tls.client_config())?;
        }
        let channel = endpoint.connect().await?;
        Ok(Self::from_channel(channel))
    }

    /// Use an existing channel.
    #[must_use]
    pub const fn from_channel(channel: Channel) -> Self {
        Self {
            channel,
            pacing: Duration::ZERO,
            timeout: None,
        }
    }

    /// Delay between items of the caller's own request sequences.
    #[must_use]
    pub const fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Bound every unary call by `timeout`; the deadline is also sent to
    /// the callee.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Delay between items of the caller's own request sequences.
    #[must_use]
    pub const fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Run a unary call, bounded by the configured timeout if any.
    async fn unary<Req, Resp, F, Fut>(&self, message: Req, call: F) -> Result<Resp, CallError>
    where
        F: FnOnce(Request<Req>) -> Fut,
        Fut: Future<Output = Result<Response<Resp>, Status>>,
    {
        match self.timeout {
            Some(timeout) => {
                call_with_deadline(timeout, call(with_deadline(message, timeout))).await
            }
            None => Ok(call(Request::new(message)).await?.into_inner()),
        }
    }

    fn calculator(&self) -> CalculatorServiceClient<Channel> {
        CalculatorServiceClient::new(self.channel.clone())
    }

    fn greet_client(&self) -> GreetServiceClient<Channel> {
        GreetServiceClient::new(self.channel.clone())
    }

    fn blog(&self) -> BlogServiceClient<Channel> {
        BlogServiceClient::new(self.channel.clone())
    }

    // -------------------------------------------------------------------------
    // Calculator
    // -------------------------------------------------------------------------

    /// `Sum`.
    ///
    /// # Errors
    ///
    /// The classified call status.
    pub async fn sum(&self, first_number: i32, second_number: i32) -> Result<i32, CallError> {
        let mut client = self.calculator();
        let request = SumRequest {
            first_number,
            second_number,
        };
        let response = self
            .unary(request, |r| async move { client.sum(r).await })
            .await?;
        Ok(response.sum_result)
    }

    /// `SquareRoot`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for negative input.
    pub async fn square_root(&self, number: i32) -> Result<f64, CallError> {
        let mut client = self.calculator();
        let response = self
            .unary(SquareRootRequest { number }, |r| async move {
                client.square_root(r).await
            })
            .await?;
        Ok(response.number_root)
    }

    /// `PrimeNumberDecomposition`.
    ///
    /// # Errors
    ///
    /// The classified status if the call cannot be opened.
    pub async fn prime_factors(
        &self,
        number: i64,
    ) -> Result<ResponseSequence<PrimeNumberDecompositionResponse, i64>, CallError> {
        let stream = self
            .calculator()
            .prime_number_decomposition(PrimeNumberDecompositionRequest { number })
            .await?
            .into_inner();
        Ok(ResponseSequence::new(stream, |r| r.prime_number))
    }

    /// `ComputeAverage`, sending one number per pacing interval.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty sequence.
    pub async fn compute_average(&self, numbers: Vec<i32>) -> Result<f64, CallError> {
        let body = paced_body(
            numbers
                .into_iter()
                .map(|number| ComputeAverageRequest { number })
                .collect(),
            self.pacing,
        );
        let response = self.calculator().compute_average(body).await?;
        Ok(response.into_inner().average)
    }

    /// Open `FindMaximum` for interactive use.
    ///
    /// # Errors
    ///
    /// The classified status if the call cannot be opened.
    pub async fn open_find_maximum(
        &self,
    ) -> Result<DuplexSession<FindMaximumRequest, FindMaximumResponse, i32>, CallError> {
        let mut client = self.calculator();
        open_duplex(
            |body: ReceiverStream<FindMaximumRequest>| async move {
                client.find_maximum(body).await
            },
            |r: FindMaximumResponse| r.maximum,
        )
        .await
    }

    /// `FindMaximum` over `numbers`: the send loop runs in its own task while
    /// the maxima are received here.
    ///
    /// # Errors
    ///
    /// The call's terminal status on failure.
    pub async fn find_maximum(&self, numbers: Vec<i32>) -> Result<Vec<i32>, CallError> {
        let (sender, responses) = self.open_find_maximum().await?.split();
        let requests = numbers
            .into_iter()
            .map(|number| FindMaximumRequest { number })
            .collect();
        let send_loop = spawn_send_loop(sender, requests, self.pacing);

        let maxima = responses.collect().await?;
        join_send_loop(send_loop).await?;
        Ok(maxima)
    }

    // -------------------------------------------------------------------------
    // Greet
    // -------------------------------------------------------------------------

    /// `Greet`.
    ///
    /// # Errors
    ///
    /// The classified call status.
    pub async fn greet(&self, person: &Person) -> Result<String, CallError> {
        let mut client = self.greet_client();
        let request = GreetRequest {
            greeting: greeting(person),
        };
        let response = self
            .unary(request, |r| async move { client.greet(r).await })
            .await?;
        Ok(response.result)
    }

    /// `GreetManyTimes`.
    ///
    /// # Errors
    ///
    /// The classified status if the call cannot be opened.
    pub async fn greet_many_times(
        &self,
        person: &Person,
    ) -> Result<ResponseSequence<GreetManyTimesResponse, String>, CallError> {
        let stream = self
            .greet_client()
            .greet_many_times(GreetManyTimesRequest {
                greeting: greeting(person),
            })
            .await?
            .into_inner();
        Ok(ResponseSequence::new(stream, |r| r.result))
    }

    /// `LongGreet`, sending one person per pacing interval.
    ///
    /// # Errors
    ///
    /// The classified call status.
    pub async fn long_greet(&self, people: &[Person]) -> Result<String, CallError> {
        let body = paced_body(
            people
                .iter()
                .map(|p| LongGreetRequest {
                    greeting: greeting(p),
                })
                .collect(),
            self.pacing,
        );
        let response = self.greet_client().long_greet(body).await?;
        Ok(response.into_inner().result)
    }

    /// Open `GreetEveryone` for interactive use.
    ///
    /// # Errors
    ///
    /// The classified status if the call cannot be opened.
    pub async fn open_greet_everyone(
        &self,
    ) -> Result<DuplexSession<GreetEveryoneRequest, GreetEveryoneResponse, String>, CallError>
    {
        let mut client = self.greet_client();
        open_duplex(
            |body: ReceiverStream<GreetEveryoneRequest>| async move {
                client.greet_everyone(body).await
            },
            |r: GreetEveryoneResponse| r.result,
        )
        .await
    }

    /// `GreetEveryone` over `people`.
    ///
    /// # Errors
    ///
    /// The call's terminal status on failure.
    pub async fn greet_everyone(&self, people: &[Person]) -> Result<Vec<String>, CallError> {
        let (sender, responses) = self.open_greet_everyone().await?.split();
        let requests = people
            .iter()
            .map(|p| GreetEveryoneRequest {
                greeting: greeting(p),
            })
            .collect();
        let send_loop = spawn_send_loop(sender, requests, self.pacing);

        let replies = responses.collect().await?;
        join_send_loop(send_loop).await?;
        Ok(replies)
    }

    /// `GreetWithDeadline` bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// `DeadlineExceeded` when the greeting takes longer than `timeout`.
    pub async fn greet_with_deadline(
        &self,
        person: &Person,
        timeout: Duration,
    ) -> Result<String, CallError> {
        let mut client = self.greet_client();
        let request = with_deadline(
            GreetWithDeadlineRequest {
                greeting: greeting(person),
            },
            timeout,
        );
        let response = call_with_deadline(timeout, client.greet_with_deadline(request)).await?;
        Ok(response.result)
    }

    // -------------------------------------------------------------------------
    // Blog
    // -------------------------------------------------------------------------

    /// `CreateBlog`.
    ///
    /// # Errors
    ///
    /// The classified call status.
    pub async fn create_blog(&self, draft: BlogDraft) -> Result<Blog, CallError> {
        let mut client = self.blog();
        let request = CreateBlogRequest {
            blog: Some(blog_proto::Blog {
                id: String::new(),
                author_id: draft.author_id,
                title: draft.title,
                content: draft.content,
            }),
        };
        let response = self
            .unary(request, |r| async move { client.create_blog(r).await })
            .await?;
        required_blog(response.blog)
    }

    /// `ReadBlog` by textual id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent.
    pub async fn read_blog(&self, blog_id: &str) -> Result<Blog, CallError> {
        let mut client = self.blog();
        let request = ReadBlogRequest {
            blog_id: blog_id.to_string(),
        };
        let response = self
            .unary(request, |r| async move { client.read_blog(r).await })
            .await?;
        required_blog(response.blog)
    }

    /// `UpdateBlog` for the blog with textual id `blog_id`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent.
    pub async fn update_blog(&self, blog_id: &str, draft: BlogDraft) -> Result<Blog, CallError> {
        let mut client = self.blog();
        let request = UpdateBlogRequest {
            blog: Some(blog_proto::Blog {
                id: blog_id.to_string(),
                author_id: draft.author_id,
                title: draft.title,
                content: draft.content,
            }),
        };
        let response = self
            .unary(request, |r| async move { client.update_blog(r).await })
            .await?;
        required_blog(response.blog)
    }

    /// `DeleteBlog`, returning the echoed id.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a malformed id, `NotFound` when absent.
    pub async fn delete_blog(&self, blog_id: &str) -> Result<String, CallError> {
        let mut client = self.blog();
        let request = DeleteBlogRequest {
            blog_id: blog_id.to_string(),
        };
        let response = self
            .unary(request, |r| async move { client.delete_blog(r).await })
            .await?;
        Ok(response.blog_id)
    }

    /// `ListBlog`.
    ///
    /// # Errors
    ///
    /// The classified status if the call cannot be opened.
    pub async fn list_blogs(
        &self,
    ) -> Result<ResponseSequence<ListBlogResponse, Result<Blog, CallError>>, CallError> {
        let stream = self.blog().list_blog(ListBlogRequest {}).await?.into_inner();
        Ok(ResponseSequence::new(stream, listed_blog))
    }
}
