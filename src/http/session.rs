//! One client connection paired with one upstream connection.
//!
//! # Lifecycle
//! ```text
//! AwaitingRequest --(OPTIONS)--------> preflight, close
//!        |
//!        +--(rejected)---------------> challenge, close
//!        |
//!        +--(accepted)--> Forwarding --(keep-alive)--> AwaitingRequest
//!                              |
//!                              +--(close)--> close
//! ```
//! Requests on a connection are handled strictly in order. A transport fault
//! or timeout on either side ends the session without a response. Every exit
//! path shuts down the client's send side.

use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use hyper::header::{HeaderValue, CONNECTION};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::blockchain::SharedVerifier;
use crate::http::request;
use crate::http::response::{self, ChallengeResponder, ResponseError};
use crate::http::ProxyBody;
use crate::observability::metrics;
use crate::payments::{self, Decision, Policy};
use crate::resilience::timeouts::{deadline, Elapsed};

/// Why a session ended abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("upstream handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("upstream exchange failed: {0}")]
    Upstream(#[source] hyper::Error),

    #[error(transparent)]
    Timeout(#[from] Elapsed),

    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error("client connection failed: {0}")]
    Client(#[source] hyper::Error),
}

/// State shared by every session.
#[derive(Debug)]
pub struct SessionContext {
    pub policy: Policy,
    pub verifier: SharedVerifier,
    pub responder: ChallengeResponder,
    /// Longest wait for the next request head.
    pub idle_timeout: Duration,
    /// Longest wait for an upstream response head.
    pub upstream_timeout: Duration,
}

type Upstream = Arc<Mutex<SendRequest<Incoming>>>;

/// Serve `client` until it closes, forwarding paid requests over `upstream`.
pub async fn run_session<C, U>(context: Arc<SessionContext>, client: C, upstream: U) -> Result<(), SessionError>
where
    C: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    U: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut client_builder = hyper::client::conn::http1::Builder::new();
    client_builder.preserve_header_case(true);
    let (sender, upstream_conn) = client_builder
        .handshake(TokioIo::new(upstream))
        .await
        .map_err(SessionError::Handshake)?;

    let upstream_task = tokio::spawn(async move {
        if let Err(e) = upstream_conn.await {
            tracing::debug!(error = %e, "Upstream connection ended with error");
        }
    });

    let sender: Upstream = Arc::new(Mutex::new(sender));
    let idle_timeout = context.idle_timeout;
    let service = service_fn(move |req| handle(context.clone(), sender.clone(), req));

    let mut server_builder = hyper::server::conn::http1::Builder::new();
    server_builder
        .preserve_header_case(true)
        .auto_date_header(false)
        .timer(TokioTimer::new())
        .header_read_timeout(idle_timeout);

    // hyper borrows the socket; it is shut down below whatever the outcome.
    let mut client = TokioIo::new(client);
    let result = server_builder
        .serve_connection(&mut client, service)
        .without_shutdown()
        .await
        .map(|_| ())
        .map_err(SessionError::Client);

    upstream_task.abort();

    let mut client = client.into_inner();
    if let Err(e) = client.shutdown().await {
        tracing::warn!(error = %e, "Client shutdown failed");
    }
    result
}

async fn handle(
    context: Arc<SessionContext>,
    upstream: Upstream,
    req: Request<Incoming>,
) -> Result<Response<ProxyBody>, SessionError> {
    tracing::debug!(method = %req.method(), target = %req.uri(), version = ?req.version(), "Request received");

    if response::is_preflight(req.method()) {
        return Ok(context.responder.preflight()?);
    }

    let decision = {
        let authorization = request::authorization(req.headers());
        payments::evaluate(authorization.as_deref(), &context.policy, &context.verifier).await
    };

    match decision {
        Decision::Accepted(_) => forward(&context, &upstream, req).await,
        Decision::Rejected(reason) => Ok(context.responder.challenge(&context.policy, reason.as_ref())?),
    }
}

async fn forward(
    context: &SessionContext,
    upstream: &Upstream,
    req: Request<Incoming>,
) -> Result<Response<ProxyBody>, SessionError> {
    let start = Instant::now();
    let exchange = async {
        let mut sender = upstream.lock().await;
        sender.ready().await.map_err(SessionError::Upstream)?;
        sender.send_request(req).await.map_err(SessionError::Upstream)
    };
    let response = deadline("upstream exchange", context.upstream_timeout, exchange).await??;
    metrics::record_upstream_duration(start);

    let keep_alive = request::is_keep_alive(response.version(), response.headers());
    let (mut parts, body) = response.into_parts();
    if !keep_alive {
        parts.headers.insert(CONNECTION, HeaderValue::from_static("close"));
    }
    tracing::debug!(status = %parts.status, keep_alive, "Relaying upstream response");

    Ok(Response::from_parts(parts, body.boxed_unsync()))
}
