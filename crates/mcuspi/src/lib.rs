//! Host-side link layer for a request/response microcontroller peripheral.
//!
//! mcuspi frames application messages into fixed 1096-byte packets with a
//! CRC32, and reassembles received packets into a bounded queue that callers
//! drain one message at a time.
//!
//! # Crate Structure
//!
//! - [`transport`]: Fixed-frame transport adapter (device nodes, streams, loopback)
//! - [`frame`]: Packet codec, message type, and bounded message queue
//! - [`session`]: Outbound/inbound session buffers and the receive path

/// Re-export transport types.
pub mod transport {
    pub use mcuspi_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use mcuspi_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use mcuspi_session::*;
}
