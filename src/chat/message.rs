//! Chat message types and the in-memory message store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Agent,
}

/// A single entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    /// Placeholder for "agent is composing"
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
}

impl Message {
    fn new(content: String, sender: Sender, is_loading: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            sender,
            timestamp: Utc::now(),
            is_loading,
        }
    }
}

/// Ordered message sequence for one conversation.
///
/// Insertion order is display order. Messages are never edited in place,
/// only appended and removed.
#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message with a fresh id and the current time
    pub fn append(&mut self, content: impl Into<String>, sender: Sender) -> Message {
        let message = Message::new(content.into(), sender, false);
        self.messages.push(message.clone());
        message
    }

    /// Append an empty agent placeholder
    pub fn append_loading(&mut self) -> Message {
        let message = Message::new(String::new(), Sender::Agent, true);
        self.messages.push(message.clone());
        message
    }

    /// Remove by id. Returns false if nothing matched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// The current loading placeholder, if any
    pub fn loading(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_loading)
    }

    /// Copy of the current sequence
    pub fn list(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut store = MessageStore::new();
        let a = store.append("first", Sender::User);
        let b = store.append("second", Sender::Agent);

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, a.id);
        assert_eq!(list[1].id, b.id);
        assert_ne!(a.id, b.id);
        assert!(!list[0].is_loading);
    }

    #[test]
    fn test_append_loading_is_empty_agent_placeholder() {
        let mut store = MessageStore::new();
        let loading = store.append_loading();

        assert!(loading.is_loading);
        assert!(loading.content.is_empty());
        assert_eq!(loading.sender, Sender::Agent);
        assert_eq!(store.loading().map(|m| m.id.clone()), Some(loading.id));
    }

    #[test]
    fn test_remove_missing_id_is_noop() {
        let mut store = MessageStore::new();
        store.append("hello", Sender::User);

        assert!(!store.remove("does-not-exist"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = MessageStore::new();
        let keep = store.append("keep", Sender::User);
        let loading = store.append_loading();

        assert!(store.remove(&loading.id));
        assert!(store.loading().is_none());
        assert_eq!(store.list(), vec![keep]);
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut store = MessageStore::new();
        store.append("one", Sender::User);
        let snapshot = store.list();

        store.append("two", Sender::Agent);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut store = MessageStore::new();
        store.append("one", Sender::User);
        store.append_loading();
        store.clear();

        assert!(store.is_empty());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_message_wire_format() {
        let mut store = MessageStore::new();
        let user = store.append("hi", Sender::User);
        let loading = store.append_loading();

        let user_json = serde_json::to_value(&user).unwrap();
        assert_eq!(user_json["sender"], "user");
        assert_eq!(user_json["content"], "hi");
        assert!(user_json.get("isLoading").is_none());

        let loading_json = serde_json::to_value(&loading).unwrap();
        assert_eq!(loading_json["sender"], "agent");
        assert_eq!(loading_json["isLoading"], true);
    }
}
