//! FIFO queue of bot replies waiting out their typing delay.
//!
//! A reply is never due before the reply queued ahead of it, so replies come
//! out in the order their inputs went in even when a later input asked for
//! a shorter delay.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use crate::models::FlowPayload;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingReply {
    pub text: String,
    pub flow: FlowPayload,
    pub due_at: Instant,
}

#[derive(Debug, Default)]
pub struct ReplyQueue {
    pending: VecDeque<PendingReply>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply `delay` after `now`, but no earlier than the tail.
    pub fn push(&mut self, now: Instant, delay: Duration, text: impl Into<String>, flow: FlowPayload) {
        let requested = now + delay;
        let due_at = match self.tail_due() {
            Some(tail) if tail > requested => tail,
            _ => requested,
        };
        self.enqueue(text.into(), flow, due_at);
    }

    /// Queues a follow-up `gap` after the current tail (or after `now` when
    /// the queue is empty).
    pub fn push_after_tail(
        &mut self,
        now: Instant,
        gap: Duration,
        text: impl Into<String>,
        flow: FlowPayload,
    ) {
        let base = self.tail_due().unwrap_or(now);
        self.enqueue(text.into(), flow, base + gap);
    }

    fn enqueue(&mut self, text: String, flow: FlowPayload, due_at: Instant) {
        tracing::debug!(queued = self.pending.len() + 1, "reply scheduled");
        self.pending.push_back(PendingReply { text, flow, due_at });
    }

    fn tail_due(&self) -> Option<Instant> {
        self.pending.back().map(|r| r.due_at)
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.front().map(|r| r.due_at)
    }

    /// Removes the head if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<PendingReply> {
        match self.pending.front() {
            Some(head) if head.due_at <= now => self.pending.pop_front(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
