//! In-memory duplex link for tests and loopback runs.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

use super::{Deadline, LinkError, LinkRead, LinkWrite};

/// One direction of the pipe.
struct Pipe {
    state: Mutex<PipeState>,
    available: Condvar,
}

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
    closed: bool,
}

impl Pipe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PipeState::default()),
            available: Condvar::new(),
        })
    }

    fn close(&self) {
        self.state.lock().expect("lock poisoned").closed = true;
        self.available.notify_all();
    }
}

/// In-memory duplex byte link.
///
/// [`MemoryLink::pair`] returns two connected ends; bytes written to one end
/// are read from the other, in order. Dropping either end closes both
/// directions: the peer drains whatever was already written and then sees
/// [`LinkError::Closed`].
pub struct MemoryLink {
    incoming: Arc<Pipe>,
    outgoing: Arc<Pipe>,
}

impl MemoryLink {
    /// Creates two connected ends.
    pub fn pair() -> (MemoryLink, MemoryLink) {
        let a_to_b = Pipe::new();
        let b_to_a = Pipe::new();
        (
            MemoryLink {
                incoming: Arc::clone(&b_to_a),
                outgoing: Arc::clone(&a_to_b),
            },
            MemoryLink {
                incoming: a_to_b,
                outgoing: b_to_a,
            },
        )
    }
}

impl LinkRead for MemoryLink {
    fn read_until(&mut self, buf: &mut [u8], deadline: Deadline) -> Result<usize, LinkError> {
        let mut filled = 0;
        let mut state = self.incoming.state.lock().expect("lock poisoned");
        while filled < buf.len() {
            if let Some(byte) = state.buf.pop_front() {
                buf[filled] = byte;
                filled += 1;
                continue;
            }
            if state.closed {
                if filled == 0 {
                    return Err(LinkError::Closed);
                }
                return Ok(filled);
            }
            match deadline.remaining() {
                None => {
                    state = self.incoming.available.wait(state).expect("lock poisoned");
                }
                Some(rem) if rem.is_zero() => return Ok(filled),
                Some(rem) => {
                    let (guard, _) = self
                        .incoming
                        .available
                        .wait_timeout(state, rem)
                        .expect("lock poisoned");
                    state = guard;
                }
            }
        }
        Ok(filled)
    }
}

impl LinkWrite for MemoryLink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, LinkError> {
        let mut state = self.outgoing.state.lock().expect("lock poisoned");
        if state.closed {
            return Err(LinkError::Closed);
        }
        state.buf.extend(buf.iter().copied());
        self.outgoing.available.notify_all();
        Ok(buf.len())
    }
}

impl Drop for MemoryLink {
    fn drop(&mut self) {
        self.incoming.close();
        self.outgoing.close();
    }
}
