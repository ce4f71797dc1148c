//! Fixed-size packet framing and message queueing for the mcuspi link layer.
//!
//! Every message crosses the wire as one 1096-byte frame:
//! - A preamble byte (`0xAA`) and a wrapping serial number
//! - A 64-byte caller-defined descriptor
//! - A 2-byte little-endian payload length and a 1024-byte payload region
//! - A CRC32 placed directly after the valid payload bytes
//!
//! Received messages wait in a bounded [`MessageQueue`] until a caller
//! pulls them out.

pub mod codec;
pub mod error;
pub mod message;
pub mod queue;

#[cfg(feature = "async")]
pub mod stream_codec;

pub use codec::{
    checksum, decode_packet, encode_packet, CodecConfig, LengthPolicy, Packet, PacketDecoder,
    PacketEncoder, PreambleCheck, RawFrame, SerialCheck, CHECKSUM_SIZE, DESCRIPTOR_SIZE,
    FRAME_SIZE, HEADER_SIZE, MAX_PAYLOAD, PREAMBLE,
};
pub use error::{FrameError, QueueError, QueueResult, Result};
pub use message::Message;
pub use queue::{MessageQueue, DEFAULT_QUEUE_CAPACITY};

#[cfg(feature = "async")]
pub use stream_codec::PacketCodec;
