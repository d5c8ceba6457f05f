//! Conversation state and the reducer that streamed text flows through

use crate::error::ConversationError;
use crate::events::ChatRole;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GREETING: &str =
    "Hi! I'm the Headstarter support assistant. How can I help you today?";

pub const END_OF_CONVERSATION_NOTICE: &str =
    "Conversation ended. Let me know if you need any help in the future";

/// A single message in the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Local::now(),
        }
    }
}

/// Message as sent to the chat backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: ChatRole,
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Ordered conversation. Never empty; the last message is the open turn
/// while a reply is being written.
#[derive(Debug, Clone)]
pub struct ConversationStore {
    messages: Vec<ChatMessage>,
    revision: u64,
}

impl ConversationStore {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::Assistant, greeting)],
            revision: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Bumped on every change. Views scroll to the latest message when it
    /// moves past the value they last rendered.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a user message followed by an empty assistant placeholder.
    /// Blank text is ignored and reported as `false`.
    pub fn append_user_turn(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }

        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.messages.push(ChatMessage::new(ChatRole::Assistant, ""));
        self.touch();
        true
    }

    /// Append streamed text to the open assistant turn
    pub fn append_to_open_turn(&mut self, fragment: &str) -> Result<(), ConversationError> {
        let open = self.open_turn_mut()?;
        open.content.push_str(fragment);
        self.touch();
        Ok(())
    }

    /// Replace the open assistant turn's content wholesale
    pub fn resolve_open_turn(&mut self, text: &str) -> Result<(), ConversationError> {
        let open = self.open_turn_mut()?;
        open.content = text.to_string();
        self.touch();
        Ok(())
    }

    /// Drop everything and leave only the end-of-conversation notice
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::new(
            ChatRole::Assistant,
            END_OF_CONVERSATION_NOTICE,
        )];
        self.touch();
    }

    /// The conversation as `{role, content}` pairs, in order
    pub fn wire_history(&self) -> Vec<WireMessage> {
        self.messages.iter().map(WireMessage::from).collect()
    }

    fn open_turn_mut(&mut self) -> Result<&mut ChatMessage, ConversationError> {
        match self.messages.last_mut() {
            Some(message) if message.role == ChatRole::Assistant => Ok(message),
            _ => Err(ConversationError::NoOpenTurn),
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_GREETING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(store: &ConversationStore) -> Vec<ChatRole> {
        store.messages().iter().map(|m| m.role).collect()
    }

    #[test]
    fn starts_with_single_greeting() {
        let store = ConversationStore::default();
        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].role, ChatRole::Assistant);
        assert_eq!(store.messages()[0].content, DEFAULT_GREETING);
    }

    #[test]
    fn user_turn_opens_empty_placeholder() {
        let mut store = ConversationStore::default();
        let before = store.revision();

        assert!(store.append_user_turn("Where is my order?"));

        assert_eq!(
            roles(&store),
            vec![ChatRole::Assistant, ChatRole::User, ChatRole::Assistant]
        );
        assert_eq!(store.messages()[1].content, "Where is my order?");
        assert_eq!(store.messages()[2].content, "");
        assert!(store.revision() > before);
    }

    #[test]
    fn blank_user_turn_is_ignored() {
        let mut store = ConversationStore::default();
        let before = store.revision();

        assert!(!store.append_user_turn("   "));
        assert!(!store.append_user_turn(""));

        assert_eq!(store.len(), 1);
        assert_eq!(store.revision(), before);
    }

    #[test]
    fn fragments_accumulate_on_open_turn() {
        let mut store = ConversationStore::default();
        store.append_user_turn("hi");

        for fragment in ["Hel", "lo, ", "world"] {
            store.append_to_open_turn(fragment).unwrap();
        }

        assert_eq!(store.last().unwrap().content, "Hello, world");
        assert_eq!(store.messages()[1].content, "hi");
    }

    #[test]
    fn resolve_replaces_partial_content() {
        let mut store = ConversationStore::default();
        store.append_user_turn("hi");
        store.append_to_open_turn("Hel").unwrap();

        store.resolve_open_turn("sorry").unwrap();

        assert_eq!(store.last().unwrap().content, "sorry");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn writing_after_user_message_is_a_contract_violation() {
        let mut store = ConversationStore::default();
        store.messages.push(ChatMessage::new(ChatRole::User, "dangling"));

        assert_eq!(
            store.append_to_open_turn("x"),
            Err(ConversationError::NoOpenTurn)
        );
        assert_eq!(
            store.resolve_open_turn("x"),
            Err(ConversationError::NoOpenTurn)
        );
        assert_eq!(store.last().unwrap().content, "dangling");
    }

    #[test]
    fn reset_leaves_only_the_end_notice() {
        let mut store = ConversationStore::default();
        store.append_user_turn("one");
        store.resolve_open_turn("first").unwrap();
        store.append_user_turn("two");

        store.reset();

        assert_eq!(store.len(), 1);
        assert_eq!(store.messages()[0].role, ChatRole::Assistant);
        assert_eq!(store.messages()[0].content, END_OF_CONVERSATION_NOTICE);
    }

    #[test]
    fn wire_history_keeps_order_and_drops_timestamps() {
        let mut store = ConversationStore::new("hello");
        store.append_user_turn("question");

        let json = serde_json::to_value(store.wire_history()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "assistant", "content": "hello"},
                {"role": "user", "content": "question"},
                {"role": "assistant", "content": ""},
            ])
        );
    }
}
