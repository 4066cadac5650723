// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newline-delimited JSON framing for push channels.
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ChannelError;

/// Longest accepted frame; a peer streaming bytes without a newline is cut
/// off here instead of growing the buffer forever.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Encodes `Out` frames and decodes `In` frames as one JSON value per line.
///
/// The push protocol is message-based; a newline terminator reproduces that
/// framing on a plain byte stream.
#[derive(Clone, Debug)]
pub struct JsonCodec<In, Out> {
    _phantom: PhantomData<(In, Out)>,
}

impl<In, Out> JsonCodec<In, Out> {
    pub fn new() -> Self {
        JsonCodec {
            _phantom: PhantomData,
        }
    }
}

impl<In, Out> Default for JsonCodec<In, Out> {
    fn default() -> Self {
        Self::new()
    }
}

impl<In, Out> Encoder<Out> for JsonCodec<In, Out>
where
    Out: Serialize,
{
    type Error = ChannelError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes =
            serde_json::to_vec(&item).map_err(|err| ChannelError::Codec(err.to_string()))?;
        dst.reserve(bytes.len() + 1);
        dst.extend_from_slice(&bytes);
        dst.put_u8(b'\n');
        Ok(())
    }
}

impl<In, Out> Decoder for JsonCodec<In, Out>
where
    In: DeserializeOwned,
{
    type Item = In;
    type Error = ChannelError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(newline) = src.iter().position(|byte| *byte == b'\n') else {
            if src.len() > MAX_FRAME_LEN {
                return Err(ChannelError::Codec(format!(
                    "frame exceeds {MAX_FRAME_LEN} bytes"
                )));
            }
            return Ok(None);
        };
        if newline > MAX_FRAME_LEN {
            return Err(ChannelError::Codec(format!(
                "frame exceeds {MAX_FRAME_LEN} bytes"
            )));
        }
        let line = src.split_to(newline);
        // Drop the terminator itself.
        src.advance(1);
        let item =
            serde_json::from_slice(&line).map_err(|err| ChannelError::Codec(err.to_string()))?;
        Ok(Some(item))
    }
}

#[cfg(test)]
mod tests {
    use crate::message::{ClientMessage, ServerEvent};

    use super::*;

    #[test]
    fn encodes_one_frame_per_line() {
        let mut codec = JsonCodec::<ClientMessage, ServerEvent>::new();
        let mut buf = BytesMut::new();
        codec.encode(ServerEvent::Ping, &mut buf).unwrap();
        codec
            .encode(ServerEvent::Auth { success: true }, &mut buf)
            .unwrap();
        assert_eq!(buf.iter().filter(|b| **b == b'\n').count(), 2);
    }

    #[test]
    fn decodes_partial_then_complete() {
        let mut codec = JsonCodec::<ClientMessage, ServerEvent>::new();
        let mut buf = BytesMut::from(&br#"{"type":"po"#[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"ng\"}\n{\"type\":\"ping\"}\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(ClientMessage::Pong));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(ClientMessage::Ping));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn endless_frame_is_cut_off() {
        let mut codec = JsonCodec::<ClientMessage, ServerEvent>::new();
        let mut buf = BytesMut::new();
        buf.resize(MAX_FRAME_LEN + 1, b'x');
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ChannelError::Codec(_))
        ));
    }

    #[test]
    fn garbage_is_a_codec_error() {
        let mut codec = JsonCodec::<ClientMessage, ServerEvent>::new();
        let mut buf = BytesMut::from(&b"not json\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ChannelError::Codec(_))
        ));
    }
}
