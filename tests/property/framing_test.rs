// tests/property/framing_test.rs

//! Property-based tests for the length-prefixed frame codec.

use agentd::core::AgentError;
use agentd::core::protocol::{FrameCodec, LENGTH_PREFIX_LEN, encode_frame};
use bytes::{Bytes, BytesMut};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_encoded_length_prefix_matches_payload(
        payload in prop::collection::vec(any::<u8>(), 0..4096)
    ) {
        let frame = encode_frame(&payload).unwrap();
        prop_assert_eq!(frame.len(), LENGTH_PREFIX_LEN + payload.len());
        let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]);
        prop_assert_eq!(declared as usize, payload.len());
        prop_assert_eq!(&frame[LENGTH_PREFIX_LEN..], &payload[..]);
    }

    #[test]
    fn test_frames_survive_arbitrary_read_boundaries(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..512), 1..16),
        chunk in 1usize..64,
    ) {
        let mut codec = FrameCodec::new();
        let mut wire = BytesMut::new();
        for payload in &payloads {
            codec.encode(Bytes::copy_from_slice(payload), &mut wire).unwrap();
        }

        // Feed the stream a few bytes at a time, as a socket might deliver it.
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();
        for piece in wire.chunks(chunk) {
            buf.extend_from_slice(piece);
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                decoded.push(frame.to_vec());
            }
        }
        prop_assert!(buf.is_empty());
        prop_assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        prop_assert_eq!(decoded, payloads);
    }

    #[test]
    fn test_truncated_stream_never_yields_partial_frame(
        payload in prop::collection::vec(any::<u8>(), 1..512),
        cut in 1usize..512,
    ) {
        let frame = encode_frame(&payload).unwrap();
        let cut = cut.min(frame.len() - 1);
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&frame[..cut]);
        prop_assert_eq!(codec.decode(&mut buf).unwrap(), None);
        let is_framing_error = matches!(codec.decode_eof(&mut buf), Err(AgentError::Framing(_)));
        prop_assert!(is_framing_error);
    }

    #[test]
    fn test_declared_length_above_limit_is_rejected(
        max in 0usize..1024,
        excess in 1u32..1024,
    ) {
        let declared = max as u32 + excess;
        let mut codec = FrameCodec::with_max_frame_length(max);
        let mut buf = BytesMut::from(&declared.to_be_bytes()[..]);
        prop_assert_eq!(
            codec.decode(&mut buf).unwrap_err(),
            AgentError::FrameTooLarge { len: declared as usize, max }
        );
    }
}
