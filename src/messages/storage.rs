use super::types::{Message, Sender};
use parking_lot::RwLock;
use std::sync::Arc;

/// Visible conversation log, shared between the orchestrator and readers
#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    /// The reply currently on display: whichever arrived last
    pub fn latest_reply(&self) -> Option<Message> {
        self.messages
            .read()
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Assistant)
            .cloned()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_reply_is_last_assistant_message() {
        let storage = MessageStorage::new();
        assert!(storage.latest_reply().is_none());

        storage.add(Message::assistant("first"));
        storage.add(Message::user("question"));
        storage.add(Message::assistant("second"));
        storage.add(Message::user("another"));

        assert_eq!(storage.latest_reply().unwrap().content, "second");
        assert_eq!(storage.len(), 4);
    }

    #[test]
    fn test_clones_share_log() {
        let storage = MessageStorage::new();
        let reader = storage.clone();
        storage.add(Message::user("hi"));
        assert_eq!(reader.len(), 1);

        reader.clear();
        assert!(storage.is_empty());
    }
}
