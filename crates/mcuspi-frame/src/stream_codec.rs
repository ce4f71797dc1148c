use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{CodecConfig, Packet, PacketDecoder, PacketEncoder, FRAME_SIZE};
use crate::error::FrameError;
use crate::message::Message;

/// `tokio_util` codec moving fixed-size frames over an async byte stream.
///
/// A rejected frame is still consumed, so the stream stays frame-aligned
/// for callers that choose to keep reading after an error.
#[derive(Debug, Default)]
pub struct PacketCodec {
    encoder: PacketEncoder,
    decoder: PacketDecoder,
}

impl PacketCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            encoder: PacketEncoder::new(),
            decoder: PacketDecoder::new(config),
        }
    }
}

impl Decoder for PacketCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FRAME_SIZE {
            src.reserve(FRAME_SIZE - src.len());
            return Ok(None);
        }

        let frame = src.split_to(FRAME_SIZE);
        self.decoder.decode(&frame).map(Some)
    }
}

impl<'a> Encoder<&'a Message> for PacketCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut frame = [0u8; FRAME_SIZE];
        self.encoder.encode(item, &mut frame);
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
