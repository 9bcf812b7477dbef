//! Bounded drop-oldest queue between the frame decoder and the USB submit loop.
//!
//! # Why drop the oldest? (for beginners)
//!
//! The device node decodes reports off the serial link faster than a busy
//! USB interface can always accept them, so a queue sits between the two.
//! The queue must be bounded (an unbounded queue would turn a stalled USB
//! interface into unbounded memory growth and ever-growing input lag), which
//! forces a policy for the moment it fills up:
//!
//! - **Reject the new report** and the PC is stuck with stale input: the
//!   keys you pressed a second ago win over the ones you are pressing now.
//! - **Evict the oldest report** and the PC sees the freshest state the
//!   moment the interface drains. For interactive input, fresh beats
//!   complete.
//!
//! This queue evicts the oldest. The evicted element is returned to the
//! caller rather than logged here, so the caller can say *what* was dropped
//! in its own terms.
//!
//! # Thread safety
//!
//! One producer (the decode loop) and one consumer (the submit loop) share
//! each queue through a `Mutex`. Operations hold the lock for a push or pop
//! only; neither side ever blocks waiting for the other.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Default number of reports a per-interface queue holds.
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;

/// A bounded FIFO that evicts its oldest element when full.
///
/// # Examples
///
/// ```rust
/// use hidlink_core::queue::ReportQueue;
///
/// let queue: ReportQueue<u8> = ReportQueue::with_capacity(2);
/// assert_eq!(queue.enqueue(1), None);
/// assert_eq!(queue.enqueue(2), None);
/// assert_eq!(queue.enqueue(3), Some(1)); // full: the oldest is evicted
/// assert_eq!(queue.try_dequeue(), Some(2));
/// ```
pub struct ReportQueue<T> {
    inner: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> ReportQueue<T> {
    /// Creates a queue holding at most `capacity` elements.
    ///
    /// A capacity of zero is clamped to one; a queue that can hold nothing
    /// cannot express drop-oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends `item`, evicting and returning the oldest element when the
    /// queue is already full. The new item always enters.
    pub fn enqueue(&self, item: T) -> Option<T> {
        let mut queue = self.inner.lock().expect("lock poisoned");
        let evicted = if queue.len() == self.capacity {
            queue.pop_front()
        } else {
            None
        };
        queue.push_back(item);
        evicted
    }

    /// Removes and returns the oldest element, or `None` when empty. Never
    /// blocks.
    pub fn try_dequeue(&self) -> Option<T> {
        self.inner.lock().expect("lock poisoned").pop_front()
    }

    /// Current number of queued elements.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock poisoned").len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The fixed capacity this queue was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
