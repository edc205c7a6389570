use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use url::Url;

use crate::error::HttpError;

use super::{RequestSpec, Transport};

#[derive(Debug, Clone, Copy)]
pub(crate) struct MockBehavior {
    pub(crate) status: u16,
    pub(crate) latency: Duration,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            status: 200,
            latency: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl CapturedRequest {
    pub(crate) fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// Keep-alive HTTP/1.1 server answering every request with a fixed status.
pub(crate) struct MockServer {
    addr: SocketAddr,
    hits: Arc<AtomicU64>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    accept_task: JoinHandle<()>,
}

impl MockServer {
    pub(crate) async fn start(behavior: MockBehavior) -> Result<Self, String> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("bind failed: {}", err))?;
        let addr = listener
            .local_addr()
            .map_err(|err| format!("local_addr failed: {}", err))?;
        let hits = Arc::new(AtomicU64::new(0));
        let captured = Arc::new(Mutex::new(Vec::new()));

        let accept_hits = Arc::clone(&hits);
        let accept_captured = Arc::clone(&captured);
        let accept_task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let hits = Arc::clone(&accept_hits);
                let captured = Arc::clone(&accept_captured);
                tokio::spawn(async move {
                    drop(serve_connection(stream, behavior, &hits, &captured).await);
                });
            }
        });

        Ok(Self {
            addr,
            hits,
            captured,
            accept_task,
        })
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url, String> {
        Url::parse(&format!("http://{}{}", self.addr, path))
            .map_err(|err| format!("bad mock url: {}", err))
    }

    pub(crate) fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn captured(&self) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

async fn serve_connection(
    stream: TcpStream,
    behavior: MockBehavior,
    hits: &AtomicU64,
    captured: &Mutex<Vec<CapturedRequest>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    loop {
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).await? == 0 {
            return Ok(());
        }
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_owned();
        let path = parts.next().unwrap_or_default().to_owned();

        let mut headers = Vec::new();
        let mut content_length: usize = 0;
        let mut close = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_owned();
                let value = value.trim().to_owned();
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.parse().unwrap_or(0);
                }
                if name.eq_ignore_ascii_case("connection") && value.eq_ignore_ascii_case("close")
                {
                    close = true;
                }
                headers.push((name, value));
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await?;

        let is_head = method.eq_ignore_ascii_case("HEAD");
        captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedRequest {
                method,
                path,
                headers,
                body,
            });
        hits.fetch_add(1, Ordering::SeqCst);

        if !behavior.latency.is_zero() {
            tokio::time::sleep(behavior.latency).await;
        }

        let reason = reqwest::StatusCode::from_u16(behavior.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown");
        let mut response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n",
            behavior.status, reason
        );
        response.push_str(if close {
            "Connection: close\r\n\r\n"
        } else {
            "Connection: keep-alive\r\n\r\n"
        });
        if !is_head {
            response.push_str("ok");
        }
        reader.get_mut().write_all(response.as_bytes()).await?;
        reader.get_mut().flush().await?;
        if close {
            return Ok(());
        }
    }
}

/// In-memory [`Transport`] that answers with a fixed status after an
/// optional delay and counts every call.
#[derive(Debug)]
pub(crate) struct CountingTransport {
    status: u16,
    latency: Duration,
    calls: AtomicU64,
}

impl CountingTransport {
    pub(crate) const fn new(status: u16, latency: Duration) -> Self {
        Self {
            status,
            latency,
            calls: AtomicU64::new(0),
        }
    }

    pub(crate) fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for CountingTransport {
    async fn exchange(&self, _target: &Url, _spec: &RequestSpec) -> Result<u16, HttpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.status)
    }
}

/// Transport whose every exchange fails immediately.
#[derive(Debug, Default)]
pub(crate) struct FailingTransport;

/// Panics inside every exchange.
pub(crate) struct PanickingTransport;

#[async_trait]
#[expect(clippy::panic)]
impl Transport for PanickingTransport {
    async fn exchange(&self, _target: &Url, _spec: &RequestSpec) -> Result<u16, HttpError> {
        panic!("transport exploded");
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn exchange(&self, _target: &Url, _spec: &RequestSpec) -> Result<u16, HttpError> {
        Err(HttpError::Cancelled)
    }
}
