/// Errors surfaced to callers of session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] mcuspi_transport::TransportError),

    /// Frame-level error.
    ///
    /// No `Session` method returns this; the receive path reports decode
    /// failures through `ReceiveOutcome`. It lets callers that decode
    /// captured frames themselves use `?` alongside session operations.
    #[error("frame error: {0}")]
    Frame(#[from] mcuspi_frame::FrameError),

    /// Message queue error.
    #[error("queue error: {0}")]
    Queue(#[from] mcuspi_frame::QueueError),
}

impl SessionError {
    /// True when the caller can retry after more data arrives.
    pub fn is_queue_empty(&self) -> bool {
        matches!(self, Self::Queue(mcuspi_frame::QueueError::Empty))
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
