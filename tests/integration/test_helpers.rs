// tests/integration/test_helpers.rs

//! Test helpers for running a real server over TCP.

use agentd::config::Config;
use agentd::core::protocol::{FrameCodec, Request, Response};
use agentd::{Server, ServerHandle};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// How long a test waits for a response that is expected to arrive.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sets up minimal tracing for tests (ignored if already initialized).
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Starts `server` on an ephemeral loopback port.
pub async fn start(server: Server) -> ServerHandle {
    init_tracing();
    server
        .start("127.0.0.1:0")
        .await
        .expect("Failed to start test server")
}

/// Creates a server with default configuration and no commands.
pub fn test_server() -> Server {
    Server::new(Config::default())
}

/// A framed client speaking the request/response protocol.
pub struct TestClient {
    framed: Framed<TcpStream, FrameCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr)
            .await
            .expect("Failed to connect to test server");
        Self {
            framed: Framed::new(stream, FrameCodec::new()),
        }
    }

    /// Sends a request without waiting for the response.
    pub async fn send(&mut self, id: u32, method: &str, params: Value) {
        let payload = Request::new(id, method, params).to_bytes().unwrap();
        self.framed.send(payload).await.unwrap();
    }

    /// Sends an arbitrary payload inside a well-formed frame.
    pub async fn send_payload(&mut self, payload: &'static [u8]) {
        self.framed.send(Bytes::from_static(payload)).await.unwrap();
    }

    /// Writes raw bytes straight to the socket, bypassing framing.
    pub async fn send_raw(&mut self, bytes: &[u8]) {
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await.unwrap();
        stream.flush().await.unwrap();
    }

    /// Closes the client's write half; the read half stays open.
    pub async fn shutdown_write(&mut self) {
        self.framed.get_mut().shutdown().await.unwrap();
    }

    /// Waits for the next response, panicking if none arrives in time.
    pub async fn recv(&mut self) -> Response {
        self.recv_within(RESPONSE_TIMEOUT)
            .await
            .expect("no response before timeout")
    }

    /// Waits up to `wait` for the next response. Returns `None` on timeout.
    /// Panics if the server closed the connection instead.
    pub async fn recv_within(&mut self, wait: Duration) -> Option<Response> {
        match tokio::time::timeout(wait, self.framed.next()).await {
            Err(_) => None,
            Ok(Some(Ok(frame))) => Some(Response::from_slice(&frame).unwrap()),
            Ok(Some(Err(e))) => panic!("connection failed while waiting for a response: {e}"),
            Ok(None) => panic!("server closed the connection"),
        }
    }

    /// Sends a request and waits for its response.
    pub async fn call(&mut self, id: u32, method: &str, params: Value) -> Response {
        self.send(id, method, params).await;
        self.recv().await
    }

    /// Returns true if the server closes the stream within the response timeout.
    pub async fn is_closed_by_server(&mut self) -> bool {
        match tokio::time::timeout(RESPONSE_TIMEOUT, self.framed.next()).await {
            Ok(None) | Ok(Some(Err(_))) => true,
            Ok(Some(Ok(_))) | Err(_) => false,
        }
    }
}
