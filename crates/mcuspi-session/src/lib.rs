//! Session buffers and receive path for the mcuspi link layer.
//!
//! A [`Session`] is one logical connection to the microcontroller. Callers
//! compose an outbound message in place and transmit it; the transport's
//! receive notification decodes inbound frames into the session's queue,
//! from which callers pull one message at a time into the inbound buffer.

pub mod config;
pub mod error;
pub mod receiver;
pub mod session;
pub mod stats;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use receiver::spawn_receiver;
pub use session::{ReceiveOutcome, Session};
pub use stats::ReceiveStats;
