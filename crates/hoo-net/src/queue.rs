//! Pending message queues owned by the main loop.
//!
//! [`OutgoingQueue`] holds requests in send order until the session is open.
//! [`IncomingQueue`] holds decoded answers until the application pops them,
//! evicting entries nobody claimed within the stale threshold.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::protocol::{AnswerKind, Request, TypedAnswer};

/// Default age after which an unclaimed answer is dropped.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(10);

/// FIFO of requests waiting to be flushed to the socket engine.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    requests: VecDeque<Request>,
}

impl OutgoingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, request: Request) {
        self.requests.push_back(request);
    }

    /// Next request to send, left in place until [`pop_front`](Self::pop_front).
    pub fn front(&self) -> Option<&Request> {
        self.requests.front()
    }

    pub fn pop_front(&mut self) -> Option<Request> {
        self.requests.pop_front()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

/// A decoded answer and the instant it was queued.
#[derive(Debug, Clone)]
pub struct IncomingEntry {
    pub answer: TypedAnswer,
    pub received_at: Instant,
}

/// FIFO of answers waiting for the application.
#[derive(Debug, Default)]
pub struct IncomingQueue {
    entries: VecDeque<IncomingEntry>,
}

impl IncomingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, answer: TypedAnswer, received_at: Instant) {
        self.entries.push_back(IncomingEntry {
            answer,
            received_at,
        });
    }

    /// Drop every entry older than `max_age` at `now`. Returns how many were evicted.
    ///
    /// Survivors keep their relative order.
    pub fn prune_stale(&mut self, now: Instant, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            let age = now.saturating_duration_since(entry.received_at);
            if age > max_age {
                tracing::warn!(
                    "Message {} has been pending for more than {}s. Removing it from queue.",
                    entry.answer.kind(),
                    max_age.as_secs_f32()
                );
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    /// Whether any queued answer's kind is in `filter`.
    pub fn contains_any(&self, filter: &[AnswerKind]) -> bool {
        self.entries.iter().any(|e| e.answer.matches(filter))
    }

    /// Remove and return the first answer (in queue order) whose kind is in `filter`.
    pub fn take_first(&mut self, filter: &[AnswerKind]) -> Option<TypedAnswer> {
        let index = self.entries.iter().position(|e| e.answer.matches(filter))?;
        self.entries.remove(index).map(|e| e.answer)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IncomingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Both directions of pending traffic for one session.
#[derive(Debug, Default)]
pub struct PendingQueue {
    pub outgoing: OutgoingQueue,
    pub incoming: IncomingQueue,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
    }
}
