use bytes::{Buf, BufMut};
use tracing::trace;

pub use mcuspi_transport::{RawFrame, FRAME_SIZE};

use crate::error::{FrameError, Result};
use crate::message::Message;

/// Marker byte at the start of every frame.
pub const PREAMBLE: u8 = 0xAA;

/// Size of the caller-defined descriptor.
pub const DESCRIPTOR_SIZE: usize = 64;

/// Size of the payload region; also the largest valid payload length.
pub const MAX_PAYLOAD: usize = 1024;

/// Fixed header: preamble (1) + serial (1) + descriptor (64) + length (2).
pub const HEADER_SIZE: usize = 2 + DESCRIPTOR_SIZE + 2;

/// Trailing CRC32.
pub const CHECKSUM_SIZE: usize = 4;

const _: () = assert!(HEADER_SIZE + MAX_PAYLOAD + CHECKSUM_SIZE == FRAME_SIZE);

/// Value written to the unused tail of every frame.
const FILLER: u8 = 0x00;

/// CRC32 (seed `0xFFFFFFFF`, inverted result) as carried on the wire.
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// A decoded frame: header fields plus the message it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Preamble byte as received.
    pub preamble: u8,
    /// Sender's serial number.
    pub serial: u8,
    /// The carried message.
    pub message: Message,
}

/// Encode a message into a fixed-size frame.
///
/// Wire format:
/// ```text
/// ┌──────────┬────────┬─────────────┬──────────┬──────────────────┬──────────┬─────────┐
/// │ Preamble │ Serial │ Descriptor  │ Length   │ Payload          │ CRC32    │ Filler  │
/// │ 0xAA     │ (1B)   │ (64B)       │ (2B LE)  │ (Length bytes)   │ (4B LE)  │ (rest)  │
/// └──────────┴────────┴─────────────┴──────────┴──────────────────┴──────────┴─────────┘
/// ```
///
/// The checksum covers `[0, 68 + length)` and sits right after the payload,
/// so its position moves with the length while the frame size never does.
pub fn encode_packet(serial: u8, message: &Message, out: &mut RawFrame) {
    let payload = message.payload();
    let body_len = HEADER_SIZE + payload.len();

    {
        let mut buf = &mut out[..];
        buf.put_u8(PREAMBLE);
        buf.put_u8(serial);
        buf.put_slice(message.descriptor());
        buf.put_u16_le(message.payload_len());
        buf.put_slice(payload);
        let rest = buf.remaining_mut();
        buf.put_bytes(FILLER, rest);
    }

    let crc = checksum(&out[..body_len]);
    out[body_len..body_len + CHECKSUM_SIZE].copy_from_slice(&crc.to_le_bytes());
}

/// Decode and validate one received frame.
///
/// `frame` must be exactly [`FRAME_SIZE`] bytes. Preamble checking and
/// length handling follow `config`; the serial number is reported but not
/// checked here (see [`PacketDecoder`]).
pub fn decode_packet(frame: &[u8], config: &CodecConfig) -> Result<Packet> {
    if frame.len() != FRAME_SIZE {
        return Err(FrameError::InvalidLength { len: frame.len() });
    }

    let mut header = &frame[..HEADER_SIZE];
    let preamble = header.get_u8();
    let serial = header.get_u8();
    let mut descriptor = [0u8; DESCRIPTOR_SIZE];
    header.copy_to_slice(&mut descriptor);
    let raw_len = header.get_u16_le();

    let len = match config.length {
        LengthPolicy::Reject if raw_len as usize > MAX_PAYLOAD => {
            return Err(FrameError::LengthOutOfRange { length: raw_len });
        }
        _ => (raw_len as usize).min(MAX_PAYLOAD),
    };

    let body_len = HEADER_SIZE + len;
    let expected = (&frame[body_len..body_len + CHECKSUM_SIZE]).get_u32_le();
    let actual = checksum(&frame[..body_len]);
    if expected != actual {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    if config.preamble == PreambleCheck::Require && preamble != PREAMBLE {
        return Err(FrameError::InvalidPreamble { found: preamble });
    }

    Ok(Packet {
        preamble,
        serial,
        message: Message::from_parts(&descriptor, &frame[HEADER_SIZE..body_len]),
    })
}

/// Producer-side codec state: owns the serial number counter.
#[derive(Debug, Clone, Default)]
pub struct PacketEncoder {
    next_serial: u8,
}

impl PacketEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `serial`.
    pub fn with_serial(serial: u8) -> Self {
        Self {
            next_serial: serial,
        }
    }

    /// Serial number the next frame will carry.
    pub fn next_serial(&self) -> u8 {
        self.next_serial
    }

    /// Encode `message` with the next serial number and return that number.
    pub fn encode(&mut self, message: &Message, out: &mut RawFrame) -> u8 {
        let serial = self.next_serial;
        self.next_serial = serial.wrapping_add(1);
        encode_packet(serial, message, out);
        trace!(serial, len = message.payload_len(), "encoded packet");
        serial
    }
}

/// Consumer-side codec state: applies [`CodecConfig`] and tracks serials.
#[derive(Debug, Clone, Default)]
pub struct PacketDecoder {
    config: CodecConfig,
    last_serial: Option<u8>,
}

impl PacketDecoder {
    pub fn new(config: CodecConfig) -> Self {
        Self {
            config,
            last_serial: None,
        }
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decode a frame, enforcing serial continuity when configured.
    ///
    /// An out-of-sequence frame is rejected but still resynchronizes the
    /// expected serial, so one gap yields one error.
    pub fn decode(&mut self, frame: &[u8]) -> Result<Packet> {
        let packet = decode_packet(frame, &self.config)?;

        let previous = self.last_serial.replace(packet.serial);
        if self.config.serial == SerialCheck::Sequential {
            if let Some(previous) = previous {
                let expected = previous.wrapping_add(1);
                if packet.serial != expected {
                    return Err(FrameError::SerialOutOfSequence {
                        expected,
                        found: packet.serial,
                    });
                }
            }
        }

        Ok(packet)
    }

    /// Forget the serial history.
    pub fn reset(&mut self) {
        self.last_serial = None;
    }
}

/// What to do with the preamble byte of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreambleCheck {
    /// Accept any preamble value.
    #[default]
    Ignore,
    /// Reject frames whose preamble is not [`PREAMBLE`].
    Require,
}

/// What to do with the serial number of a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerialCheck {
    /// Accept any serial number.
    #[default]
    Ignore,
    /// Require each frame to carry the previous serial plus one (mod 256).
    Sequential,
}

/// What to do with a payload length beyond [`MAX_PAYLOAD`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Reject the frame with [`FrameError::LengthOutOfRange`].
    #[default]
    Reject,
    /// Clamp to [`MAX_PAYLOAD`] and checksum accordingly.
    Clamp,
}

/// Configuration for the receive side of the codec.
#[derive(Debug, Clone, Default)]
pub struct CodecConfig {
    pub preamble: PreambleCheck,
    pub serial: SerialCheck,
    pub length: LengthPolicy,
}

impl CodecConfig {
    /// Require the preamble byte.
    pub fn with_preamble(mut self, preamble: PreambleCheck) -> Self {
        self.preamble = preamble;
        self
    }

    /// Require serial continuity.
    pub fn with_serial(mut self, serial: SerialCheck) -> Self {
        self.serial = serial;
        self
    }

    /// Override the length policy.
    pub fn with_length(mut self, length: LengthPolicy) -> Self {
        self.length = length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(serial: u8, message: &Message) -> RawFrame {
        let mut frame = [0u8; FRAME_SIZE];
        encode_packet(serial, message, &mut frame);
        frame
    }

    fn sample(len: usize) -> Message {
        let descriptor: Vec<u8> = (0..DESCRIPTOR_SIZE as u8).collect();
        let payload: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
        Message::from_parts(&descriptor, &payload)
    }

    #[test]
    fn hello_frame_layout() {
        let message = Message::from_parts(&[0u8; DESCRIPTOR_SIZE], b"HELLO");
        let frame = encode(0, &message);

        assert_eq!(frame.len(), 1096);
        assert_eq!(frame[0], 0xAA);
        assert_eq!(u16::from_le_bytes([frame[66], frame[67]]), 5);
        assert_eq!(&frame[68..73], b"HELLO");

        let crc = u32::from_le_bytes(frame[73..77].try_into().unwrap());
        assert_eq!(crc, checksum(&frame[..73]));
        assert!(frame[77..].iter().all(|&b| b == FILLER));
    }

    #[test]
    fn checksum_matches_reference_crc32() {
        // CRC-32/ISO-HDLC check value.
        assert_eq!(checksum(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn encode_decode_roundtrip() {
        for len in [0, 1, 5, 511, MAX_PAYLOAD - 1, MAX_PAYLOAD] {
            let message = sample(len);
            let frame = encode(42, &message);
            let packet = decode_packet(&frame, &CodecConfig::default()).unwrap();

            assert_eq!(packet.preamble, PREAMBLE);
            assert_eq!(packet.serial, 42);
            assert_eq!(packet.message, message);
        }
    }

    #[test]
    fn any_bit_flip_in_checked_range_is_detected() {
        let message = sample(20);
        let frame = encode(3, &message);
        let checked = HEADER_SIZE + 20;

        for byte in 0..checked {
            for bit in 0..8 {
                let mut corrupted = frame;
                corrupted[byte] ^= 1 << bit;
                let result = decode_packet(&corrupted, &CodecConfig::default());
                assert!(
                    matches!(
                        result,
                        Err(FrameError::ChecksumMismatch { .. })
                            | Err(FrameError::LengthOutOfRange { .. })
                    ),
                    "flip at byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn flips_in_length_field_fail_checksum() {
        // Lengths that stay in range move the checksum window; still a mismatch.
        let message = sample(20);
        let mut frame = encode(3, &message);
        frame[66] ^= 0x01;
        assert!(matches!(
            decode_packet(&frame, &CodecConfig::default()),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn padding_is_not_checked() {
        let message = sample(20);
        let mut frame = encode(3, &message);
        let tail = HEADER_SIZE + 20 + CHECKSUM_SIZE;
        for byte in frame[tail..].iter_mut() {
            *byte ^= 0xFF;
        }

        let packet = decode_packet(&frame, &CodecConfig::default()).unwrap();
        assert_eq!(packet.message, message);
    }

    #[test]
    fn wrong_length_input_rejected() {
        let err = decode_packet(&[0u8; FRAME_SIZE - 1], &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::InvalidLength { len } if len == FRAME_SIZE - 1));
    }

    fn frame_with_raw_length(raw_len: u16) -> RawFrame {
        let mut frame = encode(0, &sample(0));
        frame[66..68].copy_from_slice(&raw_len.to_le_bytes());
        let body_len = HEADER_SIZE + (raw_len as usize).min(MAX_PAYLOAD);
        let crc = checksum(&frame[..body_len]);
        frame[body_len..body_len + CHECKSUM_SIZE].copy_from_slice(&crc.to_le_bytes());
        frame
    }

    #[test]
    fn oversized_length_rejected_by_default() {
        let frame = frame_with_raw_length(2000);
        let err = decode_packet(&frame, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, FrameError::LengthOutOfRange { length: 2000 }));
    }

    #[test]
    fn oversized_length_clamped_in_compat_mode() {
        let frame = frame_with_raw_length(u16::MAX);
        let config = CodecConfig::default().with_length(LengthPolicy::Clamp);
        let packet = decode_packet(&frame, &config).unwrap();
        assert_eq!(packet.message.payload_len() as usize, MAX_PAYLOAD);
    }

    #[test]
    fn preamble_ignored_unless_required() {
        let mut frame = encode(0, &sample(4));
        frame[0] = 0x55;
        let crc = checksum(&frame[..HEADER_SIZE + 4]);
        frame[HEADER_SIZE + 4..HEADER_SIZE + 8].copy_from_slice(&crc.to_le_bytes());

        let lenient = decode_packet(&frame, &CodecConfig::default()).unwrap();
        assert_eq!(lenient.preamble, 0x55);

        let strict = CodecConfig::default().with_preamble(PreambleCheck::Require);
        let err = decode_packet(&frame, &strict).unwrap_err();
        assert!(matches!(err, FrameError::InvalidPreamble { found: 0x55 }));
    }

    #[test]
    fn encoder_serial_wraps() {
        let mut encoder = PacketEncoder::with_serial(254);
        let mut frame = [0u8; FRAME_SIZE];
        let message = sample(1);

        assert_eq!(encoder.encode(&message, &mut frame), 254);
        assert_eq!(frame[1], 254);
        assert_eq!(encoder.encode(&message, &mut frame), 255);
        assert_eq!(encoder.encode(&message, &mut frame), 0);
        assert_eq!(frame[1], 0);
        assert_eq!(encoder.next_serial(), 1);
    }

    #[test]
    fn sequential_serials_enforced_when_configured() {
        let message = sample(2);
        let mut decoder =
            PacketDecoder::new(CodecConfig::default().with_serial(SerialCheck::Sequential));

        decoder.decode(&encode(255, &message)).unwrap();
        decoder.decode(&encode(0, &message)).unwrap();
        let err = decoder.decode(&encode(5, &message)).unwrap_err();
        assert!(matches!(
            err,
            FrameError::SerialOutOfSequence {
                expected: 1,
                found: 5
            }
        ));
        // Resynchronized on the rejected frame.
        decoder.decode(&encode(6, &message)).unwrap();
    }

    #[test]
    fn serials_ignored_by_default() {
        let message = sample(2);
        let mut decoder = PacketDecoder::default();
        decoder.decode(&encode(9, &message)).unwrap();
        decoder.decode(&encode(200, &message)).unwrap();
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_message() -> impl Strategy<Value = Message> {
            (
                prop::collection::vec(any::<u8>(), 0..=DESCRIPTOR_SIZE),
                prop::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD),
            )
                .prop_map(|(descriptor, payload)| Message::from_parts(&descriptor, &payload))
        }

        /// Lengths at both ends of the range, where the checksum sits at
        /// offset 68 or runs flush against the end of the frame.
        fn arb_edge_message() -> impl Strategy<Value = Message> {
            (
                prop::collection::vec(any::<u8>(), DESCRIPTOR_SIZE),
                prop_oneof![Just(0usize), Just(1), Just(MAX_PAYLOAD - 1), Just(MAX_PAYLOAD)],
                any::<u8>(),
            )
                .prop_map(|(descriptor, len, fill)| {
                    let payload: Vec<u8> =
                        (0..len).map(|i| fill.wrapping_add(i as u8)).collect();
                    Message::from_parts(&descriptor, &payload)
                })
        }

        fn assert_flip_detected(message: &Message, serial: u8, pos: usize, bit: u8) {
            let mut frame = encode(serial, message);
            let checked = HEADER_SIZE + message.payload().len();
            let byte = pos % checked;
            frame[byte] ^= 1 << bit;

            let config = CodecConfig::default().with_length(LengthPolicy::Clamp);
            let result = decode_packet(&frame, &config);
            assert!(
                matches!(result, Err(FrameError::ChecksumMismatch { .. })),
                "flip at byte {byte} bit {bit} (len {}) gave {result:?}",
                message.payload().len()
            );
        }

        proptest! {
            /// Any message survives encode then decode unchanged.
            #[test]
            fn prop_encode_decode_roundtrip(message in arb_message(), serial in any::<u8>()) {
                let frame = encode(serial, &message);
                let packet = decode_packet(&frame, &CodecConfig::default()).unwrap();
                prop_assert_eq!(packet.serial, serial);
                prop_assert_eq!(packet.preamble, PREAMBLE);
                prop_assert_eq!(packet.message, message);
            }

            /// A single bit flip anywhere in the checked range, length field
            /// included, fails the checksum even when lengths are clamped.
            #[test]
            fn prop_bit_flip_fails_checksum(
                message in arb_message(),
                serial in any::<u8>(),
                pos in any::<usize>(),
                bit in 0u8..8,
            ) {
                assert_flip_detected(&message, serial, pos, bit);
            }

            #[test]
            fn prop_bit_flip_fails_checksum_at_length_extremes(
                message in arb_edge_message(),
                pos in any::<usize>(),
                bit in 0u8..8,
            ) {
                assert_flip_detected(&message, 0, pos, bit);
            }
        }

        #[test]
        fn every_flip_detected_at_empty_and_full_payload() {
            for len in [0, MAX_PAYLOAD] {
                let message = sample(len);
                for pos in 0..HEADER_SIZE + len {
                    for bit in 0..8 {
                        assert_flip_detected(&message, 7, pos, bit);
                    }
                }
            }
        }
    }
}
