use crate::error::Result;

/// Size of every frame exchanged with the microcontroller.
///
/// preamble (1) + serial (1) + descriptor (64) + length (2) + payload (1024) + checksum (4).
pub const FRAME_SIZE: usize = 1096;

/// One fixed-size frame as it travels on the wire.
pub type RawFrame = [u8; FRAME_SIZE];

/// A byte-level link that moves whole frames.
///
/// The transport is assumed reliable at the byte level: a successful call
/// moved exactly [`FRAME_SIZE`] bytes. It makes no promise about the
/// contents, which is what the frame checksum is for.
pub trait Transport {
    /// Write one complete frame (blocking).
    fn write_frame(&mut self, frame: &RawFrame) -> Result<()>;

    /// Fill `buf` with one complete frame (blocking).
    fn read_frame(&mut self, buf: &mut RawFrame) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame(&mut self, frame: &RawFrame) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self, buf: &mut RawFrame) -> Result<()> {
        (**self).read_frame(buf)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_frame(&mut self, frame: &RawFrame) -> Result<()> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self, buf: &mut RawFrame) -> Result<()> {
        (**self).read_frame(buf)
    }
}
