//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::api::ApiError;
use crate::core::backend::{ChatBackend, ChatExchange};
use crate::core::conversation::{ConversationId, Message, MessageId, Sender};
use crate::core::storage::MemoryStorage;
use crate::core::store::ChatStore;

/// A backend that replays scripted replies in order and records every call.
#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<Result<ChatExchange, ApiError>>>,
    calls: Mutex<Vec<(String, Option<ConversationId>)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, reply: Result<ChatExchange, ApiError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, Option<ConversationId>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send_chat_message(
        &self,
        text: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatExchange, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), conversation_id.cloned()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted reply".to_string())))
    }
}

/// A confirmed exchange as the backend would return it, with server-side message ids.
pub fn exchange(conversation_id: &str, user_text: &str, ai_text: &str) -> ChatExchange {
    let server_message = |content: &str, sender| Message {
        id: MessageId::from(format!("srv-{}", uuid::Uuid::new_v4())),
        content: content.to_string(),
        sender,
        timestamp: Utc::now(),
        products: Vec::new(),
    };
    ChatExchange {
        conversation_id: ConversationId::from(conversation_id),
        user_message: server_message(user_text, Sender::User),
        ai_message: server_message(ai_text, Sender::Assistant),
        user_context: None,
    }
}

/// An in-memory, logged-in store.
pub fn test_store() -> ChatStore {
    let mut store = ChatStore::new(Arc::new(MemoryStorage::new()));
    store.set_authenticated(true);
    store
}
