//! # Conversation Data Model
//!
//! Messages and the conversation records that hold them.
//!
//! ```text
//! Conversation
//! ├── id: ConversationId        // backend id, or a local placeholder
//! ├── title: String             // first user message, truncated
//! ├── messages: Vec<Message>    // arrival order
//! ├── last_updated: DateTime
//! └── message_count: usize
//! ```
//!
//! A `Message` is never mutated after creation. The store only ever appends,
//! replaces a tentative record wholesale, or removes one.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::Product;

/// Maximum number of characters kept from the first user message in a title.
pub const TITLE_MAX_CHARS: usize = 50;
/// Title used when a conversation has no user message yet.
pub const UNTITLED: &str = "New Conversation";

const LOCAL_MESSAGE_PREFIX: &str = "local-";
const PLACEHOLDER_PREFIX: &str = "draft-";

/// Identifier of a message, unique within its conversation.
///
/// Locally created messages carry a `local-<uuid>` id until the backend
/// confirms them with its own id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn local() -> Self {
        Self(format!("{LOCAL_MESSAGE_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_MESSAGE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a conversation.
///
/// Either assigned by the backend after the first exchange, or a
/// `draft-<uuid>` placeholder created locally before that.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn placeholder() -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConversationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<Product>,
}

impl Message {
    /// A new user message with a fresh local id.
    pub fn user(content: impl Into<String>) -> Self {
        Self::local(content.into(), Sender::User)
    }

    /// A new assistant message with a fresh local id.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::local(content.into(), Sender::Assistant)
    }

    fn local(content: String, sender: Sender) -> Self {
        Self {
            id: MessageId::local(),
            content,
            sender,
            timestamp: Utc::now(),
            products: Vec::new(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// A saved conversation as it appears in the sidebar and in storage.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
    pub message_count: usize,
}

impl Conversation {
    /// Snapshot `messages` under `id`, deriving the title and count.
    pub fn snapshot(id: ConversationId, messages: Vec<Message>) -> Self {
        Self {
            id,
            title: derive_title(&messages),
            message_count: messages.len(),
            messages,
            last_updated: Utc::now(),
        }
    }
}

/// Title from the first user message: its first 50 characters, plus `...`
/// when anything was cut off.
pub fn derive_title(messages: &[Message]) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user()) else {
        return UNTITLED.to_string();
    };

    let mut chars = first.content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
