/// Errors that can occur while decoding a received frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The input is not exactly one frame long.
    #[error("invalid frame length ({len} bytes, expected {expected})", expected = mcuspi_transport::FRAME_SIZE)]
    InvalidLength { len: usize },

    /// The checksum carried in the frame does not match its contents.
    #[error("checksum mismatch (frame carries {expected:#010x}, computed {actual:#010x})")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The payload length field exceeds the payload region.
    #[error("payload length {length} out of range (max {max})", max = crate::codec::MAX_PAYLOAD)]
    LengthOutOfRange { length: u16 },

    /// The preamble byte is not 0xAA.
    #[error("invalid preamble {found:#04x} (expected 0xaa)")]
    InvalidPreamble { found: u8 },

    /// The serial number does not follow the previously accepted frame.
    #[error("serial number out of sequence (expected {expected}, found {found})")]
    SerialOutOfSequence { expected: u8, found: u8 },

    /// An I/O error surfaced through a stream codec.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the message queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// Every slot is occupied.
    #[error("message queue full")]
    Full,

    /// No message is queued.
    #[error("message queue empty")]
    Empty,

    /// The slot bookkeeping disagrees with the slot contents.
    ///
    /// The queue refuses all further operations once this is reported.
    #[error("message queue corrupt (slot {index} unexpectedly empty)")]
    CorruptState { index: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

pub type QueueResult<T> = std::result::Result<T, QueueError>;
