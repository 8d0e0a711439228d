//! Shared utilities for integration tests.

#![allow(dead_code)]

use futures_util::SinkExt;
use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use vault_monitor::config::MonitorConfig;
use vault_monitor::observability::{Monitor, MonitorSettings};
use vault_monitor::{HttpServer, Shutdown};

/// Generous upper bound for anything a test awaits.
pub const WAIT: Duration = Duration::from_secs(5);

/// Start a WebSocket feed on loopback.
///
/// Every accepted connection receives `frames` as text messages, then a
/// close frame.
pub async fn start_ws_feed(frames: Vec<String>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let frames = frames.clone();
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                for frame in frames {
                    if ws.send(Message::text(frame)).await.is_err() {
                        return;
                    }
                }
                let _ = ws.close(None).await;
            });
        }
    });

    addr
}

/// Start a programmable HTTP backend on loopback.
///
/// `f` is called once per request and returns the status and body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    502 => "502 Bad Gateway",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request_head(socket: &mut tokio::net::TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

/// A monitor service bound to a loopback port.
pub struct TestService {
    pub addr: SocketAddr,
    pub monitor: Arc<Monitor>,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<MonitorConfig>,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serve the full HTTP stack with logs under `log_dir`.
pub async fn spawn_service(log_dir: &Path, config: MonitorConfig) -> TestService {
    let monitor = Arc::new(Monitor::new(MonitorSettings {
        log_dir: log_dir.to_path_buf(),
        ..MonitorSettings::from_config(&config)
    }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, monitor.clone(), None);
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, config_rx, receiver).await;
    });

    TestService {
        addr,
        monitor,
        shutdown,
        config_tx,
    }
}

/// Poll `condition` every 10ms until it holds or [`WAIT`] elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
