use std::sync::{Mutex, MutexGuard, PoisonError};

use mcuspi_frame::{
    FrameError, Message, MessageQueue, PacketDecoder, PacketEncoder, QueueError, FRAME_SIZE,
};
use mcuspi_transport::{Transport, TransportError};
use tracing::{debug, error, warn};

use crate::config::SessionConfig;
use crate::error::Result;
use crate::stats::{ReceiveCounters, ReceiveStats};

/// What the receive callback did with one notification.
///
/// Every path ends here; nothing is retried and nothing is reported back to
/// the transport.
#[derive(Debug)]
pub enum ReceiveOutcome {
    /// The frame decoded and its message was queued.
    Queued,
    /// The frame failed validation and was discarded.
    Rejected(FrameError),
    /// The frame decoded but the queue was full; the message was discarded.
    QueueFull,
    /// The queue reported corrupt bookkeeping and was rebuilt empty.
    QueueReset(QueueError),
    /// The transport read failed; nothing was decoded.
    ReadFailed(TransportError),
}

impl ReceiveOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

struct Outbound {
    message: Message,
    encoder: PacketEncoder,
}

/// One logical connection to the microcontroller.
///
/// Each piece of shared state sits behind its own lock so the receive
/// callback and caller threads can run concurrently:
///
/// - outbound buffer + serial counter (fill, transmit)
/// - inbound buffer (advance, read-out)
/// - message queue (receive, advance, skip)
/// - transport (transmit, receive)
/// - decoder state (receive)
///
/// Lock order is outbound before transport, transport before decoder
/// before queue, and queue before inbound. No path takes them the other
/// way round.
pub struct Session<T> {
    name: String,
    config: SessionConfig,
    transport: Mutex<T>,
    outbound: Mutex<Outbound>,
    inbound: Mutex<Message>,
    queue: Mutex<MessageQueue>,
    decoder: Mutex<PacketDecoder>,
    counters: ReceiveCounters,
}

impl<T: Transport> Session<T> {
    /// Create a session with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        debug!(name = %config.name, capacity = config.queue_capacity, "session created");
        Self {
            name: config.name.clone(),
            transport: Mutex::new(transport),
            outbound: Mutex::new(Outbound {
                message: Message::new(),
                encoder: PacketEncoder::new(),
            }),
            inbound: Mutex::new(Message::new()),
            queue: Mutex::new(MessageQueue::with_capacity(config.queue_capacity)),
            decoder: Mutex::new(PacketDecoder::new(config.codec.clone())),
            counters: ReceiveCounters::default(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ---- outbound ----

    /// Write a chunk of the outbound payload; returns the bytes taken.
    ///
    /// `offset == 0` replaces the payload, any other offset appends.
    pub fn write_payload(&self, offset: usize, bytes: &[u8]) -> usize {
        let mut outbound = lock(&self.outbound);
        let taken = outbound.message.write_payload(offset, bytes);
        debug!(
            session = %self.name,
            offset,
            taken,
            len = outbound.message.payload_len(),
            "outbound payload written"
        );
        taken
    }

    /// Write part of the outbound descriptor; returns the bytes taken.
    pub fn write_descriptor(&self, offset: usize, bytes: &[u8]) -> usize {
        lock(&self.outbound).message.write_descriptor(offset, bytes)
    }

    /// Snapshot of the outbound message.
    pub fn outbound(&self) -> Message {
        lock(&self.outbound).message.clone()
    }

    /// Clear the outbound message.
    pub fn reset_outbound(&self) {
        lock(&self.outbound).message.clear();
    }

    /// Encode the outbound message and send it; returns the serial used.
    ///
    /// The outbound buffer is left as is, so it can be resent or edited.
    pub fn transmit(&self) -> Result<u8> {
        let mut frame = [0u8; FRAME_SIZE];
        let (serial, len) = {
            let mut outbound = lock(&self.outbound);
            let Outbound { message, encoder } = &mut *outbound;
            (encoder.encode(message, &mut frame), message.payload_len())
        };

        lock(&self.transport).write_frame(&frame)?;
        debug!(session = %self.name, serial, len, "frame transmitted");
        Ok(serial)
    }

    // ---- receive ----

    /// Receive callback: read one frame, validate it, queue its message.
    ///
    /// Called once per transport notification. Failures are logged and
    /// counted, never propagated.
    ///
    /// Drive this from a single thread, as [`spawn_receiver`] does. The
    /// transport lock is released before decoding, so two concurrent callers
    /// can queue frames out of wire order and trip
    /// [`SerialCheck::Sequential`](mcuspi_frame::SerialCheck::Sequential).
    ///
    /// [`spawn_receiver`]: crate::spawn_receiver
    pub fn on_notify(&self) -> ReceiveOutcome {
        ReceiveCounters::bump(&self.counters.received);

        let mut frame = [0u8; FRAME_SIZE];
        if let Err(err) = lock(&self.transport).read_frame(&mut frame) {
            ReceiveCounters::bump(&self.counters.read_failures);
            warn!(session = %self.name, error = %err, "frame read failed; discarded");
            return ReceiveOutcome::ReadFailed(err);
        }

        let packet = match lock(&self.decoder).decode(&frame) {
            Ok(packet) => packet,
            Err(err) => {
                let counter = match err {
                    FrameError::ChecksumMismatch { .. } => &self.counters.dropped_checksum,
                    _ => &self.counters.dropped_invalid,
                };
                ReceiveCounters::bump(counter);
                warn!(session = %self.name, error = %err, "invalid frame; discarded");
                return ReceiveOutcome::Rejected(err);
            }
        };

        let serial = packet.serial;
        let mut queue = lock(&self.queue);
        match queue.enqueue(packet.message) {
            Ok(()) => {
                ReceiveCounters::bump(&self.counters.queued);
                debug!(session = %self.name, serial, pending = queue.len(), "frame queued");
                ReceiveOutcome::Queued
            }
            Err(QueueError::Full) => {
                ReceiveCounters::bump(&self.counters.dropped_full);
                warn!(session = %self.name, serial, "queue full; message dropped");
                ReceiveOutcome::QueueFull
            }
            Err(err) => {
                ReceiveCounters::bump(&self.counters.dropped_invalid);
                self.recover_queue(&mut queue, err);
                ReceiveOutcome::QueueReset(err)
            }
        }
    }

    /// Receive-path counters.
    pub fn stats(&self) -> ReceiveStats {
        self.counters.snapshot()
    }

    // ---- inbound ----

    /// Number of messages waiting in the queue.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Pull the next queued message into the inbound buffer.
    ///
    /// Fails with `QueueError::Empty` when nothing is queued; the inbound
    /// buffer keeps its previous contents in that case.
    pub fn advance(&self) -> Result<()> {
        let mut queue = lock(&self.queue);
        let mut inbound = lock(&self.inbound);
        match queue.dequeue_into(&mut inbound) {
            Ok(()) => {
                debug!(
                    session = %self.name,
                    len = inbound.payload_len(),
                    pending = queue.len(),
                    "inbound advanced"
                );
                Ok(())
            }
            Err(err) => {
                if matches!(err, QueueError::CorruptState { .. }) {
                    self.recover_queue(&mut queue, err);
                }
                Err(err.into())
            }
        }
    }

    /// Discard the next queued message without reading it.
    pub fn skip(&self) -> Result<()> {
        let mut queue = lock(&self.queue);
        match queue.drop_one() {
            Ok(()) => Ok(()),
            Err(err) => {
                if matches!(err, QueueError::CorruptState { .. }) {
                    self.recover_queue(&mut queue, err);
                }
                Err(err.into())
            }
        }
    }

    /// Copy inbound payload bytes into `buf`; returns the bytes copied.
    ///
    /// Count and offset are clamped to the inbound payload length.
    pub fn read_payload(&self, offset: usize, buf: &mut [u8]) -> usize {
        lock(&self.inbound).read_payload(offset, buf)
    }

    /// Copy inbound descriptor bytes into `buf`; returns the bytes copied.
    pub fn read_descriptor(&self, offset: usize, buf: &mut [u8]) -> usize {
        lock(&self.inbound).read_descriptor(offset, buf)
    }

    /// Payload length of the inbound message.
    pub fn inbound_len(&self) -> u16 {
        lock(&self.inbound).payload_len()
    }

    /// Snapshot of the inbound message.
    pub fn inbound(&self) -> Message {
        lock(&self.inbound).clone()
    }

    /// Drain the queue and return how many messages were discarded.
    pub fn close(&self) -> usize {
        let dropped = lock(&self.queue).drain();
        debug!(session = %self.name, dropped, "session closed");
        dropped
    }

    /// Replace a queue that reported corrupt bookkeeping with a fresh one.
    fn recover_queue(&self, queue: &mut MessageQueue, err: QueueError) {
        error!(
            session = %self.name,
            error = %err,
            pending = queue.len(),
            "message queue corrupt; discarding its contents"
        );
        *queue = MessageQueue::with_capacity(self.config.queue_capacity);
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("name", &self.name)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
