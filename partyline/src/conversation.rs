//! The shared conversation: an ordered, append-only, resettable sequence of
//! chat messages. The sender is implicit in the originating connection and
//! never part of the payload.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub content: String,
}

#[derive(Debug, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the end, preserving arrival order.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Empty the log in one step.
    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// An ordered copy of the log. Callers cannot mutate the log through it.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(content: &str) -> Message {
        Message {
            content: content.to_owned(),
        }
    }

    #[test]
    fn appends_preserve_order() {
        let mut log = ConversationLog::new();
        log.append(message("first"));
        log.append(message("second"));
        assert_eq!(log.snapshot(), vec![message("first"), message("second")]);
    }

    #[test]
    fn reset_empties_the_log() {
        let mut log = ConversationLog::new();
        log.append(message("anything"));
        log.reset();
        assert!(log.is_empty());
        assert_eq!(log.snapshot(), Vec::<Message>::new());
    }

    #[test]
    fn snapshot_is_a_copy() {
        let mut log = ConversationLog::new();
        log.append(message("kept"));
        let mut copy = log.snapshot();
        copy.clear();
        assert_eq!(log.len(), 1);
    }
}
