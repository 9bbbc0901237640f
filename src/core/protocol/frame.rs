// src/core/protocol/frame.rs

//! Implements the length-prefixed frame format and the corresponding `Encoder`
//! and `Decoder` for network communication.
//!
//! Every message on the wire is a 4-byte unsigned big-endian length followed by
//! exactly that many payload bytes.

use crate::core::AgentError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default upper bound for a single frame payload (16 MiB).
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// A `tokio_util::codec` implementation for length-prefixed frames.
///
/// The encoder accepts any payload whose length fits in a `u32`. The decoder
/// additionally refuses declared lengths above `max_frame_length`, so a hostile
/// length prefix cannot make the server reserve gigabytes of buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_length: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Creates a codec with the default frame length limit.
    pub fn new() -> Self {
        Self {
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    /// Creates a codec that rejects incoming frames longer than `max`.
    pub fn with_max_frame_length(max: usize) -> Self {
        Self {
            max_frame_length: max,
        }
    }

    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = AgentError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let len = payload_len(payload.len())?;
        dst.reserve(LENGTH_PREFIX_LEN + payload.len());
        dst.put_u32(len);
        dst.extend_from_slice(&payload);
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = AgentError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(prefix) = src.get(..LENGTH_PREFIX_LEN) else {
            return Ok(None);
        };
        let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;

        if len > self.max_frame_length {
            return Err(AgentError::FrameTooLarge {
                len,
                max: self.max_frame_length,
            });
        }

        let frame_len = LENGTH_PREFIX_LEN + len;
        if src.len() < frame_len {
            // Reserve the rest of the frame up front so the next reads fill it
            // without repeated reallocation.
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_LEN);
        Ok(Some(src.split_to(len).freeze()))
    }

    /// At end of stream, leftover bytes mean the peer stopped mid-frame.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(AgentError::Framing(format!(
                "stream ended inside a frame ({} bytes buffered)",
                src.len()
            ))),
        }
    }
}

/// Encodes a payload into a complete frame.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes, AgentError> {
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    FrameCodec::new().encode(Bytes::copy_from_slice(payload), &mut buf)?;
    Ok(buf.freeze())
}

/// Reads exactly one frame from `reader`, waiting until it is complete.
///
/// Unlike the incremental decoder, this must return a frame: an end of stream
/// before or inside the frame is a framing error.
pub async fn read_frame<R>(reader: &mut R, max_frame_length: usize) -> Result<Bytes, AgentError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await.map_err(short_read)? as usize;
    if len > max_frame_length {
        return Err(AgentError::FrameTooLarge {
            len,
            max: max_frame_length,
        });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await.map_err(short_read)?;
    Ok(Bytes::from(payload))
}

/// Writes `payload` as a single frame and flushes the writer.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), AgentError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

fn payload_len(len: usize) -> Result<u32, AgentError> {
    u32::try_from(len).map_err(|_| AgentError::FrameTooLarge {
        len,
        max: u32::MAX as usize,
    })
}

fn short_read(e: std::io::Error) -> AgentError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        AgentError::Framing("stream ended before a complete frame was read".to_string())
    } else {
        AgentError::from(e)
    }
}
