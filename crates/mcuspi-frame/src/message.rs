use crate::codec::{DESCRIPTOR_SIZE, MAX_PAYLOAD};

/// One logical unit of application data: a fixed descriptor plus a payload.
///
/// The payload never exceeds [`MAX_PAYLOAD`] bytes, so its length always
/// fits the 16-bit length field of the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    descriptor: [u8; DESCRIPTOR_SIZE],
    payload: Vec<u8>,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            descriptor: [0u8; DESCRIPTOR_SIZE],
            payload: Vec::new(),
        }
    }
}

impl Message {
    /// Create an empty message (zeroed descriptor, no payload).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a message from raw parts.
    ///
    /// A short descriptor is zero-padded; anything past the descriptor or
    /// payload bound is dropped.
    pub fn from_parts(descriptor: &[u8], payload: &[u8]) -> Self {
        let mut message = Self::new();
        message.write_descriptor(0, descriptor);
        message.write_payload(0, payload);
        message
    }

    /// The 64-byte caller-defined descriptor.
    pub fn descriptor(&self) -> &[u8; DESCRIPTOR_SIZE] {
        &self.descriptor
    }

    /// The valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of valid payload bytes, as carried in the length field.
    pub fn payload_len(&self) -> u16 {
        // payload.len() <= MAX_PAYLOAD, which fits in u16.
        self.payload.len() as u16
    }

    /// Reset to the empty state, keeping the payload allocation.
    pub fn clear(&mut self) {
        self.descriptor = [0u8; DESCRIPTOR_SIZE];
        self.payload.clear();
    }

    /// Overwrite this message with the contents of `other` in place.
    pub fn assign_from(&mut self, other: &Message) {
        self.descriptor = other.descriptor;
        self.payload.clear();
        self.payload.extend_from_slice(&other.payload);
    }

    /// Copy a chunk into the payload and return how many bytes were taken.
    ///
    /// With `offset == 0` the chunk replaces the whole payload. Otherwise the
    /// payload grows by the chunk length and the chunk lands at `offset`.
    /// The resulting length is clamped to [`MAX_PAYLOAD`] and `offset` to
    /// `[0, length - taken]`. Bytes uncovered by growth are zero.
    pub fn write_payload(&mut self, offset: usize, bytes: &[u8]) -> usize {
        let requested = if offset == 0 {
            bytes.len()
        } else {
            self.payload.len().saturating_add(bytes.len())
        };
        let len = requested.min(MAX_PAYLOAD);
        let count = bytes.len().min(len);
        let offset = offset.min(len - count);

        self.payload.resize(len, 0);
        self.payload[offset..offset + count].copy_from_slice(&bytes[..count]);
        count
    }

    /// Overwrite part of the descriptor and return how many bytes were taken.
    pub fn write_descriptor(&mut self, offset: usize, bytes: &[u8]) -> usize {
        let offset = offset.min(DESCRIPTOR_SIZE);
        let count = bytes.len().min(DESCRIPTOR_SIZE - offset);
        self.descriptor[offset..offset + count].copy_from_slice(&bytes[..count]);
        count
    }

    /// Copy payload bytes into `buf` and return how many were copied.
    ///
    /// The count is clamped to the payload length and `offset` to
    /// `[0, length - count]`, so a read near the end slides back rather than
    /// coming up short.
    pub fn read_payload(&self, offset: usize, buf: &mut [u8]) -> usize {
        read_clamped(&self.payload, offset, buf)
    }

    /// Copy descriptor bytes into `buf` and return how many were copied.
    pub fn read_descriptor(&self, offset: usize, buf: &mut [u8]) -> usize {
        read_clamped(&self.descriptor, offset, buf)
    }
}

fn read_clamped(src: &[u8], offset: usize, buf: &mut [u8]) -> usize {
    let count = buf.len().min(src.len());
    let offset = offset.min(src.len() - count);
    buf[..count].copy_from_slice(&src[offset..offset + count]);
    count
}
