//! Queued application messages (spec.md §4.7): `PARENT_REQUEST`/
//! `PARENT_RESPONSE` delivery when the target peer isn't currently
//! connected. Retries with backoff, drains on reconnection, expires old
//! entries.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ledger_core::NodeId;

use crate::message::WireMessage;

struct QueuedMessage {
    target: NodeId,
    message: WireMessage,
    queued_at: Instant,
    attempts: u32,
}

/// Per-target FIFO queues of undelivered application messages, with bounded
/// retries and a hard expiry.
pub struct AppMessageQueue {
    queue: VecDeque<QueuedMessage>,
    max_retries: u32,
    backoff_min: Duration,
    backoff_max: Duration,
    expiry: Duration,
}

impl AppMessageQueue {
    pub fn new(max_retries: u32, backoff_min: Duration, backoff_max: Duration, expiry: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            max_retries,
            backoff_min,
            backoff_max,
            expiry,
        }
    }

    pub fn enqueue(&mut self, target: NodeId, message: WireMessage) {
        self.queue.push_back(QueuedMessage {
            target,
            message,
            queued_at: Instant::now(),
            attempts: 0,
        });
    }

    /// Drop entries older than the expiry window or that exhausted their
    /// retry budget. Call before every drain attempt.
    pub fn sweep_expired(&mut self) {
        self.queue.retain(|m| m.queued_at.elapsed() < self.expiry && m.attempts < self.max_retries);
    }

    /// Drain every queued message addressed to `target`, handing each to
    /// `deliver`. A message that fails delivery is re-queued with an
    /// incremented attempt count (dropped instead if it has hit
    /// `max_retries`); the backoff window itself is the caller's concern —
    /// this only tracks attempt counts and expiry.
    pub fn drain_for<F>(&mut self, target: &NodeId, mut deliver: F)
    where
        F: FnMut(&WireMessage) -> bool,
    {
        self.sweep_expired();
        let mut remaining = VecDeque::new();
        while let Some(mut item) = self.queue.pop_front() {
            if &item.target != target {
                remaining.push_back(item);
                continue;
            }
            if deliver(&item.message) {
                continue;
            }
            item.attempts += 1;
            if item.attempts < self.max_retries {
                remaining.push_back(item);
            }
        }
        remaining.extend(self.queue.drain(..));
        self.queue = remaining;
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Backoff to wait before retrying a message that has failed `attempts`
    /// times: linear ramp from `backoff_min` to `backoff_max`, clamped.
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return self.backoff_min;
        }
        let step = (self.backoff_max.as_secs_f64() - self.backoff_min.as_secs_f64())
            .max(0.0)
            / self.max_retries.max(1) as f64;
        let secs = self.backoff_min.as_secs_f64() + step * attempts as f64;
        Duration::from_secs_f64(secs.min(self.backoff_max.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent_request(child: &str, parent: &str) -> WireMessage {
        WireMessage::ParentRequest {
            timestamp: 1,
            child_id: NodeId::new(child),
            parent_id: NodeId::new(parent),
        }
    }

    #[test]
    fn drains_only_messages_for_the_target() {
        let mut q = AppMessageQueue::new(5, Duration::from_secs(2), Duration::from_secs(3), Duration::from_secs(300));
        q.enqueue(NodeId::new("node_a"), parent_request("c", "a"));
        q.enqueue(NodeId::new("node_b"), parent_request("d", "b"));

        let mut delivered = Vec::new();
        q.drain_for(&NodeId::new("node_a"), |msg| {
            delivered.push(msg.clone());
            true
        });
        assert_eq!(delivered.len(), 1);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn failed_delivery_is_requeued_until_retries_exhausted() {
        let mut q = AppMessageQueue::new(2, Duration::from_secs(2), Duration::from_secs(3), Duration::from_secs(300));
        q.enqueue(NodeId::new("node_a"), parent_request("c", "a"));

        q.drain_for(&NodeId::new("node_a"), |_| false);
        assert_eq!(q.len(), 1, "first failure keeps the message queued");
        q.drain_for(&NodeId::new("node_a"), |_| false);
        assert_eq!(q.len(), 0, "second failure exhausts max_retries=2");
    }

    #[test]
    fn expired_entries_are_swept() {
        let mut q = AppMessageQueue::new(5, Duration::from_secs(2), Duration::from_secs(3), Duration::from_millis(1));
        q.enqueue(NodeId::new("node_a"), parent_request("c", "a"));
        std::thread::sleep(Duration::from_millis(5));
        q.sweep_expired();
        assert!(q.is_empty());
    }
}
