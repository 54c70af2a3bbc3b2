// ABOUTME: Readiness probing for freshly started release containers.
// ABOUTME: HEAD-polls the health endpoint until it answers or the wait window closes.

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::Method;
use hyper::header::HOST;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Errors from a readiness probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("connect to {address} failed: {source}")]
    Connect {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(#[from] hyper::http::Error),

    #[error("probe attempt did not finish before the deadline")]
    AttemptTimedOut,

    #[error("not ready after {}ms and {attempts} attempts: {last}", waited.as_millis())]
    Timeout {
        waited: Duration,
        attempts: u32,
        #[source]
        last: Box<ProbeError>,
    },
}

/// A single readiness check against an address.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Succeeds if the endpoint at `address` answered.
    async fn probe(&self, address: SocketAddr) -> Result<(), ProbeError>;
}

/// HEAD request against a fixed path over plain HTTP/1.1.
///
/// Any response counts as ready: the check is that the application accepts
/// and answers requests, not what it answers.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    path: String,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, address: SocketAddr) -> Result<(), ProbeError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| ProbeError::Connect { address, source })?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(ProbeError::Handshake)?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("probe connection error: {}", e);
            }
        });

        let req = hyper::Request::builder()
            .method(Method::HEAD)
            .uri(self.path.as_str())
            .header(HOST, address.to_string())
            .body(Empty::<Bytes>::new())?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(ProbeError::Request)?;

        tracing::debug!(%address, status = %resp.status(), "probe answered");
        Ok(())
    }
}

/// Poll `probe` until it succeeds or `timeout` elapses.
///
/// Failed attempts are followed by a sleep of `interval`. Each attempt is cut
/// off at the deadline, so the total wait stays within `timeout` plus one
/// interval. No attempt starts once the deadline has passed, and the timeout
/// carries the failure of the last attempt that completed. Returns how long
/// it took to become ready.
pub async fn wait_until_ready<P: Probe + ?Sized>(
    probe: &P,
    address: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<Duration, ProbeError> {
    let start = Instant::now();
    let deadline = start + timeout;
    let mut attempts = 0u32;
    let mut last: Option<ProbeError> = None;

    loop {
        attempts += 1;
        let remaining = deadline.saturating_duration_since(Instant::now());

        match tokio::time::timeout(remaining, probe.probe(address)).await {
            Ok(Ok(())) => {
                let waited = start.elapsed();
                tracing::info!(%address, attempts, waited_ms = waited.as_millis() as u64, "ready");
                return Ok(waited);
            }
            Ok(Err(e)) => last = Some(e),
            // cut off at the deadline; an earlier failure says more
            Err(_elapsed) => {
                last.get_or_insert(ProbeError::AttemptTimedOut);
            }
        }

        if Instant::now() < deadline {
            if let Some(e) = &last {
                tracing::trace!(%address, attempts, "not ready yet: {}", e);
            }
            tokio::time::sleep(interval).await;
        }

        if Instant::now() >= deadline {
            return Err(ProbeError::Timeout {
                waited: start.elapsed(),
                attempts,
                last: Box::new(last.unwrap_or(ProbeError::AttemptTimedOut)),
            });
        }
    }
}
