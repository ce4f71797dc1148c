use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{RawFrame, Transport};

/// Moves fixed-size frames over any `Read + Write` stream.
///
/// Handles short reads and writes internally; callers always move whole
/// frames or get an error.
pub struct StreamTransport<T> {
    inner: T,
    path: Option<PathBuf>,
}

impl<T: Read + Write> StreamTransport<T> {
    /// Wrap an already-open stream.
    pub fn new(inner: T) -> Self {
        Self { inner, path: None }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Device path this transport was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl StreamTransport<File> {
    /// Open a device node (e.g. `/dev/mcuspi0` or a serial tty) for read/write.
    ///
    /// On Unix the node is opened with `O_NOCTTY` so a tty never becomes the
    /// controlling terminal of the host process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.read(true).write(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(libc::O_NOCTTY);
        }

        let file = options.open(&path).map_err(|source| TransportError::Open {
            path: path.clone(),
            source,
        })?;
        debug!(?path, "opened device node");

        Ok(Self {
            inner: file,
            path: Some(path),
        })
    }
}

/// Both directions retry `Interrupted` only. On a non-blocking stream a
/// `WouldBlock` surfaces as [`TransportError::Io`] and the partial frame is
/// lost, so device nodes are expected to be opened blocking.
impl<T: Read + Write> Transport for StreamTransport<T> {
    fn write_frame(&mut self, frame: &RawFrame) -> Result<()> {
        let mut offset = 0usize;
        while offset < frame.len() {
            match self.inner.write(&frame[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn read_frame(&mut self, buf: &mut RawFrame) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        Ok(())
    }
}

impl<T> std::fmt::Debug for StreamTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
