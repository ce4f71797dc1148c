use tracing::{debug, error};

use crate::error::{QueueError, QueueResult};
use crate::message::Message;

/// Default number of queue slots.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Bounded FIFO of received messages.
///
/// Slots live in one fixed arena addressed by two wrapping cursors. The read
/// cursor starts one slot behind the write cursor: `enqueue` stores at
/// `write_index` then advances it, while removal advances `read_index`
/// first and then reads. With that pairing the live slots are always
/// `read_index + 1 ..= read_index + count` (mod capacity).
///
/// The queue owns every message it holds; removal either copies the message
/// out and frees the slot ([`dequeue_into`](Self::dequeue_into)) or discards
/// it ([`drop_one`](Self::drop_one)). Dropping the queue drains it.
pub struct MessageQueue {
    slots: Box<[Option<Message>]>,
    read_index: usize,
    write_index: usize,
    count: usize,
    corrupt: bool,
}

impl MessageQueue {
    /// Create a queue with [`DEFAULT_QUEUE_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a queue with `capacity` slots (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            read_index: capacity - 1,
            write_index: 0,
            count: 0,
            corrupt: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of queued messages.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Whether the queue has reported [`QueueError::CorruptState`].
    pub fn is_corrupt(&self) -> bool {
        self.corrupt
    }

    /// Append a message at the tail.
    ///
    /// On [`QueueError::Full`] the message is dropped.
    pub fn enqueue(&mut self, message: Message) -> QueueResult<()> {
        self.check_state()?;
        if self.is_full() {
            return Err(QueueError::Full);
        }

        let index = self.write_index;
        self.slots[index] = Some(message);
        self.write_index = self.advance(index);
        self.count += 1;
        debug!(index, count = self.count, "message queued");
        Ok(())
    }

    /// Move the head message into `slot`, overwriting it in place.
    pub fn dequeue_into(&mut self, slot: &mut Message) -> QueueResult<()> {
        let message = self.take_head()?;
        slot.assign_from(&message);
        debug!(index = self.read_index, count = self.count, "message dequeued");
        Ok(())
    }

    /// Discard the head message.
    pub fn drop_one(&mut self) -> QueueResult<()> {
        self.take_head()?;
        debug!(index = self.read_index, count = self.count, "message dropped");
        Ok(())
    }

    /// Discard every queued message and return how many there were.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0usize;
        while self.drop_one().is_ok() {
            dropped += 1;
        }
        if self.corrupt {
            // Bookkeeping is untrustworthy; release whatever the slots still hold.
            for slot in self.slots.iter_mut() {
                *slot = None;
            }
            self.count = 0;
        }
        dropped
    }

    /// Empty the slot the next removal reads while leaving the count alone,
    /// so that removal reports [`QueueError::CorruptState`]. Returns whether
    /// a message was discarded.
    #[doc(hidden)]
    pub fn vacate_head(&mut self) -> bool {
        if self.is_empty() {
            return false;
        }
        let index = self.advance(self.read_index);
        self.slots[index].take().is_some()
    }

    fn take_head(&mut self) -> QueueResult<Message> {
        self.check_state()?;
        if self.is_empty() {
            return Err(QueueError::Empty);
        }

        // The slot under the read cursor was consumed by the previous removal.
        // It only holds a live message when the queue is full.
        if !self.is_full() {
            self.slots[self.read_index] = None;
        }

        let index = self.advance(self.read_index);
        self.read_index = index;
        match self.slots[index].take() {
            Some(message) => {
                self.count -= 1;
                Ok(message)
            }
            None => {
                self.corrupt = true;
                error!(index, count = self.count, "queue slot unexpectedly empty");
                Err(QueueError::CorruptState { index })
            }
        }
    }

    fn check_state(&self) -> QueueResult<()> {
        if self.corrupt {
            return Err(QueueError::CorruptState {
                index: self.read_index,
            });
        }
        Ok(())
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MessageQueue {
    fn drop(&mut self) {
        let dropped = self.drain();
        if dropped > 0 {
            debug!(dropped, "message queue torn down with pending messages");
        }
    }
}

impl std::fmt::Debug for MessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageQueue")
            .field("capacity", &self.capacity())
            .field("count", &self.count)
            .field("read_index", &self.read_index)
            .field("write_index", &self.write_index)
            .field("corrupt", &self.corrupt)
            .finish()
    }
}
