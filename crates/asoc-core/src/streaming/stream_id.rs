//! Outbound stream id allocation.
//!
//! Stream id 0 is reserved for the handshake. Odd ids belong to the
//! connection initiator, even ids to the acceptor; each session's
//! allocator only ever hands out its own side's parity.

use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashSet;

/// Allocates outbound stream ids for one session, wrapping at `u32::MAX`
/// with collision avoidance against ids still in flight.
pub struct StreamIdAllocator {
    next: AtomicU32,
    active: DashSet<u32>,
}

impl StreamIdAllocator {
    /// Create an allocator for the initiator (odd ids) or acceptor (even
    /// ids) side of a session.
    #[must_use]
    pub fn new(is_initiator: bool) -> Self {
        Self {
            next: AtomicU32::new(if is_initiator { 1 } else { 2 }),
            active: DashSet::new(),
        }
    }

    /// Draw a fresh id, skipping 0 and anything currently active.
    pub fn allocate(&self) -> u32 {
        loop {
            let id = self.next.fetch_add(2, Ordering::Relaxed);
            if id == 0 {
                continue;
            }
            if self.active.insert(id) {
                return id;
            }
        }
    }

    /// Release an id once its stream has ended, making it eligible for
    /// reuse after wraparound.
    pub fn release(&self, id: u32) {
        self.active.remove(&id);
    }
}

/// Whether an inbound stream id's parity is valid given this side's role.
/// The remote allocates the opposite parity from the local side.
#[must_use]
pub fn is_valid_inbound_parity(stream_id: u32, local_is_initiator: bool) -> bool {
    let is_even = stream_id % 2 == 0;
    if local_is_initiator { is_even } else { !is_even }
}
