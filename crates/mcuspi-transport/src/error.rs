use std::path::PathBuf;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the device node.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was moved.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,

    /// No frame is pending on an in-memory transport.
    #[error("no frame pending")]
    Empty,
}

pub type Result<T> = std::result::Result<T, TransportError>;
