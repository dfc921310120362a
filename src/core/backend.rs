use async_trait::async_trait;

use crate::api::ApiError;
use crate::core::conversation::{ConversationId, Message};

/// Result of one confirmed user/assistant exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatExchange {
    pub conversation_id: ConversationId,
    pub user_message: Message,
    pub ai_message: Message,
    pub user_context: Option<serde_json::Value>,
}

/// Whatever delivers a chat message and returns the confirmed exchange.
///
/// The store only talks to this trait, so tests can script replies without HTTP.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send_chat_message(
        &self,
        text: &str,
        conversation_id: Option<&ConversationId>,
    ) -> Result<ChatExchange, ApiError>;
}
