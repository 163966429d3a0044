use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Maximum number of log entries sent as history with a chat turn.
/// Older entries stay in the log but are dropped from outgoing context.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Role used for this sender in outgoing chat history.
    pub fn history_role(self) -> HistoryRole {
        match self {
            Sender::User => HistoryRole::User,
            Sender::Assistant => HistoryRole::System,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    System,
}

/// One entry of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Millisecond timestamp, bumped when needed so ids strictly increase
    pub id: i64,
    pub text: String,
    pub sender: Sender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub text: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.sender.history_role(),
            text: message.text.clone(),
        }
    }
}

/// Body of `POST /api/chat`. Built per send, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub message: String,
    pub context: String,
    pub chat_history: Vec<HistoryEntry>,
}

/// Successful reply of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
}

/// Append-only chat log. Entries are never reordered or edited; insertion
/// order is both display order and context order.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message stamped with the current time.
    pub fn push(&mut self, text: impl Into<String>, sender: Sender) -> &Message {
        let now = Utc::now().timestamp_millis();
        let id = match self.messages.last() {
            Some(last) if last.id >= now => last.id + 1,
            _ => now,
        };
        self.messages.push(Message {
            id,
            text: text.into(),
            sender,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// The last [`HISTORY_WINDOW`] entries, mapped for the assistant.
    pub fn history(&self) -> Vec<HistoryEntry> {
        history_window(&self.messages)
    }
}

pub fn history_window(messages: &[Message]) -> Vec<HistoryEntry> {
    let start = messages.len().saturating_sub(HISTORY_WINDOW);
    messages[start..].iter().map(HistoryEntry::from).collect()
}
