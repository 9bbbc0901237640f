// src/core/protocol/mod.rs

pub mod frame;
pub mod message;
pub use frame::{
    DEFAULT_MAX_FRAME_LENGTH, FrameCodec, LENGTH_PREFIX_LEN, encode_frame, read_frame, write_frame,
};
pub use message::{Request, Response};
