use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks the one in-flight request of a given kind for a screen.
///
/// Starting a request supersedes whatever was in flight before it, and
/// cancelling invalidates the current one. A superseded or cancelled request
/// may still finish; its [`RequestTicket`] then reports `false` from
/// [`is_current`](RequestTicket::is_current) and the result must be dropped.
#[derive(Debug, Default)]
pub struct RequestSlot {
    generation: Arc<AtomicU64>,
}

/// Handle for one request started on a [`RequestSlot`].
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    slot: Arc<AtomicU64>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, superseding any request already in flight.
    pub fn begin(&self) -> RequestTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            generation,
            slot: Arc::clone(&self.generation),
        }
    }

    /// Cancels the in-flight request, if any.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

impl RequestTicket {
    /// `true` while no newer request has started and the slot was not cancelled.
    pub fn is_current(&self) -> bool {
        self.slot.load(Ordering::SeqCst) == self.generation
    }
}
