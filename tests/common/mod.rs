//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use health_proxy::config::{BackendConfig, ProxyConfig};
use health_proxy::lifecycle::Shutdown;
use health_proxy::load_balancer::registry::Registry;
use health_proxy::HttpServer;

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub at: Instant,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_probe(&self, health: &str) -> bool {
        self.path == health
    }
}

/// What the mock backend does with a request.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Delayed(Duration, u16, String),
    /// Close the connection without writing anything.
    Close,
    /// Answer `101 Switching Protocols` to the given protocol, then echo
    /// every byte back.
    Upgrade(String),
}

/// Raw-TCP HTTP/1.1 backend on an ephemeral loopback port.
pub struct MockBackend {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub async fn start<F>(reply: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let reply = Arc::new(reply);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let reply = reply.clone();
                        let recorded = recorded.clone();
                        tokio::spawn(async move {
                            let _ = serve_one(socket, &*reply, &recorded).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, requests }
    }

    /// Backend that answers every request with `status`.
    pub async fn fixed(status: u16, body: &'static str) -> Self {
        Self::start(move |_| Reply::Status(status, body.to_string())).await
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Requests that were not health probes.
    pub fn traffic(&self, health: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| !r.is_probe(health))
            .collect()
    }
}

async fn serve_one<F>(
    mut socket: TcpStream,
    reply: &F,
    recorded: &Mutex<Vec<RecordedRequest>>,
) -> std::io::Result<()>
where
    F: Fn(&RecordedRequest) -> Reply,
{
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    let head_end = loop {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut start = lines.next().unwrap_or_default().split(' ');
    let method = start.next().unwrap_or_default().to_string();
    let path = start.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    // Drain a fixed-length body so closing the socket doesn't reset it.
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body_read = buf.len() - (head_end + 4);
    while body_read < content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body_read += n;
    }

    let request = RecordedRequest {
        method,
        path,
        headers,
        at: Instant::now(),
    };
    recorded.lock().unwrap().push(request.clone());

    let (status, body) = match reply(&request) {
        Reply::Status(status, body) => (status, body),
        Reply::Delayed(delay, status, body) => {
            tokio::time::sleep(delay).await;
            (status, body)
        }
        Reply::Close => return socket.shutdown().await,
        Reply::Upgrade(protocol) => {
            let response = format!(
                "HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: {}\r\n\r\n",
                protocol
            );
            socket.write_all(response.as_bytes()).await?;
            let (mut reader, mut writer) = socket.split();
            tokio::io::copy(&mut reader, &mut writer).await?;
            return Ok(());
        }
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Proxy config probing every second, pointed at `urls`.
pub fn proxy_config(urls: &[String]) -> ProxyConfig {
    let mut config = ProxyConfig {
        interval: 1,
        backends: urls.iter().map(BackendConfig::new).collect(),
        ..ProxyConfig::default()
    };
    config.apply_defaults();
    config
}

/// A proxy serving on an ephemeral loopback port.
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub registry: Arc<Registry>,
    shutdown: Shutdown,
}

impl RunningProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Poll until `check` holds for the registry, or `timeout` passes.
    pub async fn wait_for<F>(&self, timeout: Duration, check: F) -> bool
    where
        F: Fn(&Registry) -> bool,
    {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if check(&self.registry) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        check(&self.registry)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

impl Drop for RunningProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_proxy(config: ProxyConfig) -> RunningProxy {
    let server = HttpServer::new(config).unwrap();
    let registry = server.registry().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    RunningProxy {
        addr,
        registry,
        shutdown,
    }
}

/// Read an HTTP/1.1 response head from a raw socket.
pub async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        head.push(byte[0]);
    }
    String::from_utf8_lossy(&head).to_string()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
