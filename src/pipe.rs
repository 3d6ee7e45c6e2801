//! Two-lane bounded transport between a pair of cooperating threads.
//!
//! One end sends requests and receives replies; the other receives
//! requests and sends replies. Each end must be held by one thread unless
//! protected externally by a lock. While both sides keep up with each
//! other the pipe runs lock-free; the shared mutex and condvar are touched
//! only to park on an empty or full lane and to tear the pipe down.
//!
//! Pairing contract: every request consumed must eventually produce
//! exactly one reply (possibly an empty payload). Violating it stalls the
//! protocol, not the transport. The intended use is recycling a small set
//! of buffers between a cooperating pair of filters.

use crate::ring::{Gate, Ring};

/// Two-lane request/reply ring transport.
///
/// `N` is the per-lane capacity and must be a power of two. Send blocks
/// when a lane is full; receive blocks when it is empty. [`disconnect`]
/// wakes every parked call.
///
/// [`disconnect`]: Pipe::disconnect
pub struct Pipe<T, const N: usize = 256> {
    request: Ring<T, N>,
    reply: Ring<T, N>,
    gate: Gate,
}

impl<T, const N: usize> Pipe<T, N> {
    pub fn new() -> Self {
        Self {
            request: Ring::new(),
            reply: Ring::new(),
            gate: Gate::new(),
        }
    }

    /// Pipe whose lane counters start at `origin`. Lets tests drive both
    /// lanes across the u32 wraparound boundary.
    pub fn with_counter_origin(origin: u32) -> Self {
        Self {
            request: Ring::with_counter_origin(origin),
            reply: Ring::with_counter_origin(origin),
            gate: Gate::new(),
        }
    }

    /// Queue a request. Blocks while the request lane is full; hands the
    /// item back once the pipe is disconnected.
    pub fn send_request(&self, item: T) -> Result<(), T> {
        self.send(&self.request, item)
    }

    /// Next request, blocking while the lane is empty. `None` once the
    /// pipe is disconnected and drained.
    pub fn next_request(&self) -> Option<T> {
        self.receive(&self.request)
    }

    /// Queue a reply. Blocks while the reply lane is full; hands the item
    /// back once the pipe is disconnected.
    pub fn send_reply(&self, item: T) -> Result<(), T> {
        self.send(&self.reply, item)
    }

    /// Next reply, blocking while the lane is empty. `None` once the pipe
    /// is disconnected and drained.
    pub fn next_reply(&self) -> Option<T> {
        self.receive(&self.reply)
    }

    /// Non-blocking send. Hands the item back when the lane is full or
    /// the pipe is disconnected.
    pub fn try_send_request(&self, item: T) -> Result<(), T> {
        if self.gate.is_closed() {
            return Err(item);
        }
        let sent = self.request.try_push(item);
        if sent.is_ok() {
            self.gate.wake();
        }
        sent
    }

    /// Non-blocking receive from the request lane.
    pub fn try_next_request(&self) -> Option<T> {
        let item = self.request.try_pop();
        if item.is_some() {
            self.gate.wake();
        }
        item
    }

    /// Non-blocking send on the reply lane.
    pub fn try_send_reply(&self, item: T) -> Result<(), T> {
        if self.gate.is_closed() {
            return Err(item);
        }
        let sent = self.reply.try_push(item);
        if sent.is_ok() {
            self.gate.wake();
        }
        sent
    }

    /// Non-blocking receive from the reply lane.
    pub fn try_next_reply(&self) -> Option<T> {
        let item = self.reply.try_pop();
        if item.is_some() {
            self.gate.wake();
        }
        item
    }

    /// Tear the pipe down. Parked sends hand their item back, parked
    /// receives return once the lane drains. In-flight work is untouched.
    pub fn disconnect(&self) {
        self.gate.close();
    }

    #[inline(always)]
    pub fn is_disconnected(&self) -> bool {
        self.gate.is_closed()
    }

    /// Requests queued but not yet consumed.
    #[inline(always)]
    pub fn pending_requests(&self) -> u32 {
        self.request.len()
    }

    /// Replies queued but not yet consumed.
    #[inline(always)]
    pub fn pending_replies(&self) -> u32 {
        self.reply.len()
    }

    fn send(&self, lane: &Ring<T, N>, item: T) -> Result<(), T> {
        let mut item = item;
        loop {
            if self.gate.is_closed() {
                return Err(item);
            }
            match lane.try_push(item) {
                Ok(()) => {
                    self.gate.wake();
                    return Ok(());
                }
                Err(back) => {
                    item = back;
                    if !self.gate.park_until(|| !lane.is_full()) {
                        return Err(item);
                    }
                }
            }
        }
    }

    fn receive(&self, lane: &Ring<T, N>) -> Option<T> {
        loop {
            if let Some(item) = lane.try_pop() {
                self.gate.wake();
                return Some(item);
            }
            if !self.gate.park_until(|| !lane.is_empty()) {
                // Disconnected. Drain anything that landed in the race.
                return lane.try_pop();
            }
        }
    }
}

impl<T, const N: usize> Default for Pipe<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
