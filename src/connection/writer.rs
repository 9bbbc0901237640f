// src/connection/writer.rs

//! Defines `ConnectionWriter`, the shared write side of a connection.

use crate::core::AgentError;
use crate::core::protocol::FrameCodec;
use bytes::Bytes;
use futures::SinkExt;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::codec::FramedWrite;

/// The write half of a connection, shared by every dispatch running on it.
///
/// A frame is encoded and flushed while the lock is held, so the length prefix
/// and payload of one response can never interleave with bytes of another.
pub struct ConnectionWriter<W> {
    inner: Arc<Mutex<FramedWrite<W, FrameCodec>>>,
}

impl<W> Clone for ConnectionWriter<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W> ConnectionWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W, codec: FrameCodec) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FramedWrite::new(writer, codec))),
        }
    }

    /// Writes `payload` as one complete frame.
    pub async fn send_frame(&self, payload: Bytes) -> Result<(), AgentError> {
        let mut framed = self.inner.lock().await;
        framed.send(payload).await.map_err(|e| match e {
            AgentError::Io(io) => AgentError::Write(io),
            other => other,
        })
    }

    /// Flushes pending bytes and shuts the write direction down.
    pub async fn shutdown(&self) -> Result<(), AgentError> {
        let mut framed = self.inner.lock().await;
        framed.get_mut().shutdown().await?;
        Ok(())
    }
}
