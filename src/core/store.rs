//! # Chat Store
//!
//! All session state in one place, mutated only through the operations below.
//!
//! ```text
//! ChatStore
//! ├── messages: Vec<Message>              // active conversation, arrival order
//! ├── is_loading: bool                    // a send is in flight
//! ├── error: Option<String>               // last user-visible failure
//! ├── user_input: String                  // draft in the input box
//! ├── current_conversation_id: Option<ConversationId>
//! ├── conversations: Vec<Conversation>    // saved, most recent first
//! ├── sidebar_open: bool
//! ├── authenticated: bool
//! └── pending: Option<MessageId>          // tentative user message of the in-flight send
//! ```
//!
//! ## Sending
//!
//! A send is a two-phase commit on the message list:
//!
//! ```text
//! begin_send(text)            tentative user message (local id), loading on
//!      │
//!      ▼  backend call (no store borrow held)
//! complete_send(pending, Ok)  tentative message replaced by the server record,
//!                             assistant reply appended, conversation id assigned
//! complete_send(pending, Err) tentative message removed, error set,
//!                             fallback assistant message appended
//! ```
//!
//! The TUI runs the backend call on a spawned task between the two phases.
//! [`ChatStore::send_message`] does all of it in one `await` for simpler callers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::api::ApiError;
use crate::core::backend::{ChatBackend, ChatExchange};
use crate::core::conversation::{Conversation, ConversationId, Message, MessageId};
use crate::core::observer::{Listener, Observers, StoreEvent, SubscriptionId};
use crate::core::storage::{self, CONVERSATIONS_KEY, Storage};

/// Assistant message shown when a send fails.
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble connecting right now. Please try again.";
/// Delay between a confirmed exchange and the save that records it.
pub const SAVE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The operation needs a logged-in user.
    NotAuthenticated,
    ConversationNotFound(ConversationId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotAuthenticated => write!(f, "Please log in first"),
            StoreError::ConversationNotFound(id) => write!(f, "Conversation {id} not found"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Handle for a send between its two phases.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub local_id: MessageId,
    pub text: String,
    /// Conversation the tentative message went into (possibly a placeholder).
    pub conversation_id: ConversationId,
}

impl PendingSend {
    /// The id to hand the backend. Placeholders are never sent.
    pub fn backend_conversation_id(&self) -> Option<&ConversationId> {
        (!self.conversation_id.is_placeholder()).then_some(&self.conversation_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Delivered(ConversationId),
    Failed(String),
    /// The user moved to another conversation before the reply arrived.
    /// A confirmed exchange is still filed in the saved list.
    Stale,
}

pub struct ChatStore {
    storage: Arc<dyn Storage>,
    observers: Observers,
    messages: Vec<Message>,
    is_loading: bool,
    error: Option<String>,
    user_input: String,
    current_conversation_id: Option<ConversationId>,
    conversations: Vec<Conversation>,
    sidebar_open: bool,
    authenticated: bool,
    pending: Option<MessageId>,
}

impl ChatStore {
    /// Create a store, restoring saved conversations from `storage`.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let conversations: Vec<Conversation> =
            storage::load_json(storage.as_ref(), CONVERSATIONS_KEY).unwrap_or_default();
        info!("Restored {} saved conversations", conversations.len());
        Self {
            storage,
            observers: Observers::default(),
            messages: Vec::new(),
            is_loading: false,
            error: None,
            user_input: String::new(),
            current_conversation_id: None,
            conversations,
            sidebar_open: true,
            authenticated: false,
            pending: None,
        }
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.observers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn emit(&mut self, event: StoreEvent) {
        self.observers.notify(event);
    }

    // ------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn current_conversation_id(&self) -> Option<&ConversationId> {
        self.current_conversation_id.as_ref()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages_count(&self) -> usize {
        self.messages.len()
    }

    pub fn conversations_count(&self) -> usize {
        self.conversations.len()
    }

    /// The saved record of the active conversation, if it has been saved.
    pub fn current_conversation(&self) -> Option<&Conversation> {
        let id = self.current_conversation_id.as_ref()?;
        self.conversations.iter().find(|c| &c.id == id)
    }

    // ------------------------------------------------------------------
    // Simple setters
    // ------------------------------------------------------------------

    pub fn set_authenticated(&mut self, authenticated: bool) {
        if self.authenticated != authenticated {
            self.authenticated = authenticated;
            self.emit(StoreEvent::Auth);
        }
    }

    pub fn add_message(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        self.emit(StoreEvent::Messages);
        &self.messages[self.messages.len() - 1]
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> &Message {
        self.add_message(Message::user(content))
    }

    pub fn add_ai_message(&mut self, content: impl Into<String>) -> &Message {
        self.add_message(Message::assistant(content))
    }

    pub fn set_user_input(&mut self, input: impl Into<String>) {
        self.user_input = input.into();
        self.emit(StoreEvent::Input);
    }

    pub fn clear_user_input(&mut self) {
        self.set_user_input(String::new());
    }

    pub fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.emit(StoreEvent::Error);
        }
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.error = Some(error);
        self.emit(StoreEvent::Error);
    }

    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
        self.emit(StoreEvent::Loading);
    }

    pub fn toggle_sidebar(&mut self) {
        self.set_sidebar_open(!self.sidebar_open);
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.sidebar_open = open;
        self.emit(StoreEvent::Sidebar);
    }

    // ------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------

    /// Save the current conversation if it has messages, then start from nothing.
    pub fn create_new_conversation(&mut self) -> Result<(), StoreError> {
        if !self.authenticated {
            return Err(StoreError::NotAuthenticated);
        }
        if !self.messages.is_empty() {
            self.save_current_conversation();
        }
        self.current_conversation_id = None;
        self.messages.clear();
        self.error = None;
        debug!("Started a new conversation");
        self.emit(StoreEvent::ActiveConversation);
        self.emit(StoreEvent::Messages);
        self.emit(StoreEvent::Error);
        Ok(())
    }

    /// Upsert the active conversation into the saved list and persist it.
    /// No-op without an active id or without messages.
    pub fn save_current_conversation(&mut self) {
        let Some(id) = self.current_conversation_id.clone() else {
            return;
        };
        let messages: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| self.pending.as_ref() != Some(&m.id))
            .cloned()
            .collect();
        if messages.is_empty() {
            return;
        }
        // A draft holding only a failure notice is not worth a record.
        if id.is_placeholder() && !messages.iter().any(Message::is_user) {
            debug!("Skipping save of draft {} without user messages", id);
            return;
        }

        let record = Conversation::snapshot(id, messages);
        match self.conversations.iter().position(|c| c.id == record.id) {
            Some(index) => self.conversations[index] = record,
            None => self.conversations.insert(0, record),
        }
        self.persist_conversations();
        self.emit(StoreEvent::Conversations);
    }

    /// Periodic autosave; only does anything while messages exist.
    pub fn autosave(&mut self) {
        if !self.messages.is_empty() {
            self.save_current_conversation();
        }
    }

    /// Save the current conversation, then make `id` the active one.
    pub fn load_conversation(&mut self, id: &ConversationId) -> Result<(), StoreError> {
        if self.current_conversation_id.is_some() && !self.messages.is_empty() {
            self.save_current_conversation();
        }
        let conversation = self
            .conversations
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))?;

        self.messages = conversation.messages.clone();
        self.current_conversation_id = Some(id.clone());
        self.error = None;
        debug!("Loaded conversation {} ({} messages)", id, self.messages.len());
        self.emit(StoreEvent::ActiveConversation);
        self.emit(StoreEvent::Messages);
        self.emit(StoreEvent::Error);
        Ok(())
    }

    pub fn delete_conversation(&mut self, id: &ConversationId) {
        self.conversations.retain(|c| &c.id != id);
        self.persist_conversations();
        self.emit(StoreEvent::Conversations);

        if self.current_conversation_id.as_ref() == Some(id) {
            self.current_conversation_id = None;
            self.messages.clear();
            self.emit(StoreEvent::ActiveConversation);
            self.emit(StoreEvent::Messages);
        }
    }

    /// Append backend conversations not already known locally. Returns how many were added.
    pub fn merge_remote_conversations(&mut self, remote: Vec<Conversation>) -> usize {
        let mut added = 0;
        for conversation in remote {
            if self.conversations.iter().all(|c| c.id != conversation.id) {
                self.conversations.push(conversation);
                added += 1;
            }
        }
        if added > 0 {
            self.persist_conversations();
            self.emit(StoreEvent::Conversations);
        }
        added
    }

    fn persist_conversations(&self) {
        storage::save_json(self.storage.as_ref(), CONVERSATIONS_KEY, &self.conversations);
    }

    /// Make `to` the active id, moving any saved record filed under `from`.
    fn rekey_conversation(&mut self, from: Option<ConversationId>, to: ConversationId) {
        if let Some(from) = from {
            self.rekey_saved(&from, &to);
        }
        self.current_conversation_id = Some(to);
        self.emit(StoreEvent::ActiveConversation);
    }

    /// Move the saved record filed under `from` to `to`, leaving the active id alone.
    fn rekey_saved(&mut self, from: &ConversationId, to: &ConversationId) {
        if from == to {
            return;
        }
        if self.conversations.iter().any(|c| &c.id == to) {
            self.conversations.retain(|c| &c.id != from);
        } else if let Some(record) = self.conversations.iter_mut().find(|c| &c.id == from) {
            record.id = to.clone();
        } else {
            return;
        }
        info!("Conversation {} is now {}", from, to);
        self.persist_conversations();
        self.emit(StoreEvent::Conversations);
    }

    /// File a confirmed exchange whose conversation is no longer active under
    /// the backend id in the saved list.
    fn file_background_exchange(&mut self, origin: &ConversationId, exchange: ChatExchange) {
        let id = exchange.conversation_id;
        self.rekey_saved(origin, &id);

        let mut messages = self
            .conversations
            .iter()
            .position(|c| c.id == id)
            .map(|index| self.conversations.remove(index).messages)
            .unwrap_or_default();
        messages.push(exchange.user_message);
        messages.push(exchange.ai_message);

        info!("Filed late reply under conversation {}", id);
        self.conversations.insert(0, Conversation::snapshot(id, messages));
        self.persist_conversations();
        self.emit(StoreEvent::Conversations);
    }

    // ------------------------------------------------------------------
    // Sending
    // ------------------------------------------------------------------

    /// Phase one: insert the tentative user message and mark the store as loading.
    pub fn begin_send(&mut self, text: &str) -> Result<PendingSend, StoreError> {
        if !self.authenticated {
            return Err(StoreError::NotAuthenticated);
        }
        self.clear_error();

        let conversation_id = match &self.current_conversation_id {
            Some(id) => id.clone(),
            None => {
                let id = ConversationId::placeholder();
                self.current_conversation_id = Some(id.clone());
                self.emit(StoreEvent::ActiveConversation);
                id
            }
        };

        let local_id = self.add_user_message(text).id.clone();
        self.pending = Some(local_id.clone());
        self.set_loading(true);

        Ok(PendingSend {
            local_id,
            text: text.to_string(),
            conversation_id,
        })
    }

    /// Phase two: commit the server's records or roll the tentative message back.
    /// Loading is cleared either way.
    pub fn complete_send(
        &mut self,
        pending: PendingSend,
        result: Result<ChatExchange, ApiError>,
    ) -> SendOutcome {
        if self.pending.as_ref() == Some(&pending.local_id) {
            self.pending = None;
        }
        self.set_loading(false);

        if self.current_conversation_id.as_ref() != Some(&pending.conversation_id) {
            match result {
                Ok(exchange) => self.file_background_exchange(&pending.conversation_id, exchange),
                Err(e) => warn!(
                    "Dropping failed reply for conversation {}: no longer active ({})",
                    pending.conversation_id, e
                ),
            }
            return SendOutcome::Stale;
        }

        let position = self.messages.iter().position(|m| m.id == pending.local_id);
        match result {
            Ok(exchange) => {
                match position {
                    Some(index) => self.messages[index] = exchange.user_message,
                    None => self.messages.push(exchange.user_message),
                }
                self.messages.push(exchange.ai_message);
                self.emit(StoreEvent::Messages);

                let id = exchange.conversation_id;
                self.rekey_conversation(Some(pending.conversation_id), id.clone());
                SendOutcome::Delivered(id)
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                if let Some(index) = position {
                    self.messages.remove(index);
                }
                let message = e.to_string();
                self.set_error(message.clone());
                self.add_ai_message(FALLBACK_REPLY);
                SendOutcome::Failed(message)
            }
        }
    }

    /// Send `text` through `backend`, then save shortly after a confirmed exchange.
    pub async fn send_message<B: ChatBackend + ?Sized>(
        &mut self,
        text: &str,
        backend: &B,
    ) -> Result<SendOutcome, StoreError> {
        let pending = self.begin_send(text)?;
        let result = backend
            .send_chat_message(&pending.text, pending.backend_conversation_id())
            .await;
        let outcome = self.complete_send(pending, result);
        if matches!(outcome, SendOutcome::Delivered(_)) {
            tokio::time::sleep(SAVE_DELAY).await;
            self.save_current_conversation();
        }
        Ok(outcome)
    }
}
