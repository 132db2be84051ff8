//! Delivery of committed digits: a bounded FIFO for pull mode, or a
//! synchronous callback.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Digits held for pull mode when no capacity is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 128;

/// Receives `(digit, hit_blocks)` for every committed digit.
pub type DigitCallback = Box<dyn FnMut(char, u32) + Send>;

pub(crate) enum DigitSink {
    Queue {
        producer: HeapProducer<u8>,
        consumer: HeapConsumer<u8>,
    },
    Callback(DigitCallback),
}

impl DigitSink {
    pub(crate) fn queue(capacity: usize) -> Self {
        let (producer, consumer) = HeapRb::<u8>::new(capacity.max(1)).split();
        Self::Queue { producer, consumer }
    }

    /// Hand over a digit. Returns `false` if it had to be dropped.
    pub(crate) fn deliver(&mut self, digit: char, hits: u32) -> bool {
        match self {
            Self::Queue { producer, .. } => producer.push(digit as u8).is_ok(),
            Self::Callback(callback) => {
                callback(digit, hits);
                true
            }
        }
    }

    /// Move queued digits into `buf` in arrival order.
    pub(crate) fn drain(&mut self, buf: &mut [u8]) -> usize {
        let Self::Queue { consumer, .. } = self else {
            return 0;
        };
        let mut copied = 0;
        for slot in buf.iter_mut() {
            match consumer.pop() {
                Some(digit) => {
                    *slot = digit;
                    copied += 1;
                }
                None => break,
            }
        }
        copied
    }

    pub(crate) fn pending(&self) -> usize {
        match self {
            Self::Queue { consumer, .. } => consumer.len(),
            Self::Callback(_) => 0,
        }
    }

    pub(crate) fn clear(&mut self) {
        if let Self::Queue { consumer, .. } = self {
            while consumer.pop().is_some() {}
        }
    }
}

impl std::fmt::Debug for DigitSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queue { consumer, .. } => f
                .debug_struct("Queue")
                .field("pending", &consumer.len())
                .field("capacity", &consumer.capacity())
                .finish(),
            Self::Callback(_) => f.write_str("Callback"),
        }
    }
}
