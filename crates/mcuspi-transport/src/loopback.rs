use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{RawFrame, Transport, FRAME_SIZE};

/// In-memory transport.
///
/// Clones share the same buffers, so a test can keep one handle to inject
/// inbound bytes and inspect outbound frames while a session owns another.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    inbound: BytesMut,
    sent: Vec<Bytes>,
    fail_next_read: bool,
    fail_next_write: bool,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes to the inbound stream.
    pub fn inject(&self, bytes: &[u8]) {
        self.lock().inbound.extend_from_slice(bytes);
    }

    /// Number of complete frames waiting to be read.
    pub fn pending_frames(&self) -> usize {
        self.lock().inbound.len() / FRAME_SIZE
    }

    /// Drain every frame written so far.
    pub fn take_sent(&self) -> Vec<Bytes> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Move every written frame onto the inbound stream, as an echoing peer would.
    pub fn loop_back(&self) -> usize {
        let mut inner = self.lock();
        let sent = std::mem::take(&mut inner.sent);
        for frame in &sent {
            inner.inbound.extend_from_slice(frame);
        }
        sent.len()
    }

    /// Make the next `read_frame` fail with an I/O error.
    pub fn fail_next_read(&self) {
        self.lock().fail_next_read = true;
    }

    /// Make the next `write_frame` fail with an I/O error.
    pub fn fail_next_write(&self) {
        self.lock().fail_next_write = true;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for LoopbackTransport {
    fn write_frame(&mut self, frame: &RawFrame) -> Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.fail_next_write) {
            return Err(io::Error::other("injected write failure").into());
        }
        inner.sent.push(Bytes::copy_from_slice(frame));
        trace!(sent = inner.sent.len(), "loopback frame written");
        Ok(())
    }

    fn read_frame(&mut self, buf: &mut RawFrame) -> Result<()> {
        let mut inner = self.lock();
        if std::mem::take(&mut inner.fail_next_read) {
            return Err(io::Error::other("injected read failure").into());
        }
        if inner.inbound.len() < FRAME_SIZE {
            return Err(TransportError::Empty);
        }
        inner.inbound.copy_to_slice(buf);
        Ok(())
    }
}

impl std::fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("LoopbackTransport")
            .field("inbound_bytes", &inner.inbound.len())
            .field("sent_frames", &inner.sent.len())
            .finish()
    }
}
