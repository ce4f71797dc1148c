//! Fixed-frame transport adapter for the mcuspi link layer.
//!
//! The link to the microcontroller moves one fixed-size frame at a time.
//! This crate is the lowest layer: it knows nothing about headers or
//! checksums, only that every exchange is exactly [`FRAME_SIZE`] bytes.
//!
//! - [`StreamTransport`] wraps any `Read + Write` byte stream (device node,
//!   serial tty, socket pair).
//! - [`LoopbackTransport`] is an in-memory transport for tests and tooling.

pub mod error;
pub mod loopback;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackTransport;
pub use stream::StreamTransport;
pub use traits::{RawFrame, Transport, FRAME_SIZE};
