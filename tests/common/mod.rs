//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Incoming;
use hyper::client::conn::http1::SendRequest;
use hyper::header::{HeaderMap, AUTHORIZATION, CONNECTION};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use xmr402::auth::{AuthScheme, TxReference};
use xmr402::blockchain::{
    BlockchainError, BlockchainResult, PaymentVerifier, SharedVerifier, VerificationResult,
};
use xmr402::config::ProxyConfig;
use xmr402::lifecycle::{assemble, Shutdown};
use xmr402::payments::Policy;

pub const ADDRESS: &str = "5StagenetReceivingAddressForTests";
pub const TXID: &str = "9f3c2b1a0d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8";

/// Counters kept by the mock upstream.
#[derive(Debug, Default)]
pub struct UpstreamStats {
    pub connections: AtomicU32,
    pub requests: AtomicU32,
}

/// Start a keep-alive upstream that echoes the request line.
///
/// Requests to `/close` are answered with `Connection: close`.
pub async fn start_upstream() -> (SocketAddr, Arc<UpstreamStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let stats = Arc::new(UpstreamStats::default());
    let accept_stats = stats.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            accept_stats.connections.fetch_add(1, Ordering::SeqCst);
            let stats = accept_stats.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let stats = stats.clone();
                    async move {
                        stats.requests.fetch_add(1, Ordering::SeqCst);
                        let body = format!("upstream saw {} {}", req.method(), req.uri().path());
                        let mut response = Response::new(Full::new(Bytes::from(body)));
                        if req.uri().path() == "/close" {
                            response.headers_mut().insert(CONNECTION, "close".parse().unwrap());
                        }
                        Ok::<_, Infallible>(response)
                    }
                });
                let _ = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(socket), service)
                    .await;
            });
        }
    });

    (addr, stats)
}

/// Verifier returning a canned answer.
pub struct StubVerifier {
    answer: Result<VerificationResult, String>,
    calls: Arc<AtomicU32>,
}

impl StubVerifier {
    pub fn paying(amount_received: u64, confirmations: u64) -> (Self, Arc<AtomicU32>) {
        Self::answering(Ok(VerificationResult {
            amount_received,
            confirmations,
            in_mempool: false,
            proof_valid: true,
        }))
    }

    pub fn answering(answer: Result<VerificationResult, String>) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                answer,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl PaymentVerifier for StubVerifier {
    async fn refresh(&mut self) -> BlockchainResult<()> {
        Ok(())
    }

    async fn verify_proof(
        &mut self,
        _tx: &TxReference,
        _address: &str,
        _signature: &str,
    ) -> BlockchainResult<VerificationResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone().map_err(BlockchainError::Rpc)
    }

    async fn current_height(&mut self) -> BlockchainResult<u64> {
        Ok(3_000_000)
    }

    async fn address(&mut self) -> BlockchainResult<String> {
        Ok(ADDRESS.to_string())
    }
}

/// Running proxy under test.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

/// Start a proxy in front of `upstream` with `verifier` and `policy`.
pub async fn start_proxy(upstream: SocketAddr, policy: Policy, verifier: StubVerifier) -> TestProxy {
    start_proxy_with(upstream, policy, verifier, |_| {}).await
}

/// Like [`start_proxy`], with a chance to adjust the configuration.
pub async fn start_proxy_with(
    upstream: SocketAddr,
    policy: Policy,
    verifier: StubVerifier,
    configure: impl FnOnce(&mut ProxyConfig),
) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.address = upstream.to_string();
    config.upstream.connect_attempts = 1;
    config.timeouts.shutdown_grace_secs = 1;
    configure(&mut config);

    let verifier = SharedVerifier::new(verifier, Duration::from_secs(5)).await.unwrap();
    let (server, listener) = assemble(&config, policy, verifier).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    let task = tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    TestProxy { addr, shutdown, task }
}

pub fn bearer_policy() -> Policy {
    Policy::new(AuthScheme::Bearer, "0.01", 3, 150).unwrap()
}

pub fn bearer_token(signature: &str) -> String {
    format!("Bearer {TXID}:{signature}")
}

/// One client connection to the proxy.
pub struct Client {
    sender: SendRequest<Empty<Bytes>>,
    conn: JoinHandle<()>,
}

/// Response as seen by a client.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers[name].to_str().unwrap()
    }
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .unwrap();
        let conn = tokio::spawn(async move {
            let _ = conn.await;
        });
        Self { sender, conn }
    }

    pub async fn send(
        &mut self,
        method: Method,
        path: &str,
        authorization: Option<&str>,
    ) -> Result<Reply, hyper::Error> {
        let mut builder = Request::builder().method(method).uri(path).header("host", "proxy.test");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        let request = builder.body(Empty::new()).unwrap();

        self.sender.ready().await?;
        let response = self.sender.send_request(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await?.to_bytes();
        Ok(Reply {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    /// Whether the proxy closes this connection within a second.
    pub async fn closed_by_peer(self) -> bool {
        tokio::time::timeout(Duration::from_secs(1), self.conn).await.is_ok()
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    header_lines(head)
        .into_iter()
        .find(|(name, _)| name == "content-length")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(0)
}

/// Header lines of a message head as `(lowercase name, value)`, in order.
pub fn header_lines(head: &str) -> Vec<(String, String)> {
    head.split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

/// Read one `Content-Length` framed message; `None` on EOF.
///
/// Bytes past the message stay in `buf` for the next call.
pub async fn read_message(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Option<(String, Vec<u8>)> {
    let mut chunk = [0u8; 4096];
    let end = loop {
        if let Some(end) = find_head_end(buf) {
            break end;
        }
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..end]).into_owned();
    let total = end + 4 + content_length(&head);
    while buf.len() < total {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = buf[end + 4..total].to_vec();
    buf.drain(..total);
    Some((head, body))
}

/// Upstream speaking raw HTTP/1.1: records every request and answers each
/// with the same bytes.
pub struct RawUpstream {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

pub async fn start_raw_upstream(response: &'static str) -> RawUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                while let Some(message) = read_message(&mut socket, &mut buf).await {
                    seen.lock().unwrap().push(message);
                    if socket.write_all(response.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    RawUpstream { addr, requests }
}

/// Upstream that reads requests and never answers.
pub async fn start_silent_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut sink = [0u8; 1024];
                while matches!(socket.read(&mut sink).await, Ok(n) if n > 0) {}
            });
        }
    });
    addr
}
