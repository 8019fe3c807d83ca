//! Bounded conversation memory owned by a single agent.
//!
//! Insertion order is the literal context sent to the model. When the
//! message count exceeds the capacity the oldest messages are dropped,
//! along with any tool replies whose assistant turn went with them.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Default number of messages kept per agent.
pub const DEFAULT_CAPACITY: usize = 100;

/// An ordered, append-only message log with drop-oldest eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    messages: Vec<Message>,
    capacity: usize,
}

impl Memory {
    /// Create an empty memory holding at most `capacity` messages.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.evict();
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.evict();
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Trim to capacity. The kept log never starts with a tool reply,
    /// since its originating assistant turn is gone.
    fn evict(&mut self) {
        if self.messages.len() <= self.capacity {
            return;
        }
        let mut cut = self.messages.len() - self.capacity;
        while self
            .messages
            .get(cut)
            .is_some_and(|m| m.role == Role::Tool)
        {
            cut += 1;
        }
        self.messages.drain(..cut);
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
