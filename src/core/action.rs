//! # Actions
//!
//! Everything that can happen in Modista becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ResponseReceived { .. }`.
//!
//! `update()` applies an action to the store and returns an `Effect`
//! telling the adapter what I/O to start. No I/O happens here.
//!
//! ```text
//! Store + Action  →  update()  →  Store' + Effect
//! ```

use log::{debug, info};

use crate::api::ApiError;
use crate::core::backend::ChatExchange;
use crate::core::conversation::{Conversation, ConversationId};
use crate::core::store::{ChatStore, PendingSend, SendOutcome, StoreError};

#[derive(Debug)]
pub enum Action {
    Submit(String),
    ResponseReceived {
        pending: PendingSend,
        result: Result<ChatExchange, ApiError>,
    },
    NewConversation,
    LoadConversation(ConversationId),
    DeleteConversation(ConversationId),
    ToggleSidebar,
    SaveConversation,
    AutoSaveTick,
    InputChanged(String),
    DismissError,
    /// A background task failed outside the send path (search, history, ...).
    Failed(String),
    LoggedIn,
    LoggedOut,
    RemoteHistoryLoaded(Vec<Conversation>),
    Quit,
}

/// I/O the adapter should start after an update.
#[derive(Debug, PartialEq)]
pub enum Effect {
    None,
    /// Run the backend call for this pending send, then feed back `ResponseReceived`.
    SpawnSend(PendingSend),
    /// Save the conversation shortly, once the UI has settled.
    ScheduleSave,
    PromptLogin,
    Quit,
}

pub fn update(store: &mut ChatStore, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            let text = text.trim();
            if text.is_empty() || store.is_loading() {
                return Effect::None;
            }
            match store.begin_send(text) {
                Ok(pending) => {
                    store.clear_user_input();
                    Effect::SpawnSend(pending)
                }
                Err(StoreError::NotAuthenticated) => Effect::PromptLogin,
                Err(e) => {
                    store.set_error(e.to_string());
                    Effect::None
                }
            }
        }
        Action::ResponseReceived { pending, result } => {
            let lost_auth = match &result {
                Err(e) if e.is_auth() => Some(e.to_string()),
                _ => None,
            };
            let outcome = store.complete_send(pending, result);
            if let Some(reason) = lost_auth {
                info!("Session expired, asking for login");
                if outcome == SendOutcome::Stale {
                    store.set_error(reason);
                }
                store.set_authenticated(false);
                return Effect::PromptLogin;
            }
            match outcome {
                SendOutcome::Delivered(id) => {
                    debug!("Exchange confirmed for conversation {}", id);
                    Effect::ScheduleSave
                }
                SendOutcome::Failed(_) | SendOutcome::Stale => Effect::None,
            }
        }
        Action::NewConversation => match store.create_new_conversation() {
            Ok(()) => Effect::None,
            Err(_) => Effect::PromptLogin,
        },
        Action::LoadConversation(id) => {
            if let Err(e) = store.load_conversation(&id) {
                store.set_error(e.to_string());
            }
            Effect::None
        }
        Action::DeleteConversation(id) => {
            store.delete_conversation(&id);
            Effect::None
        }
        Action::ToggleSidebar => {
            store.toggle_sidebar();
            Effect::None
        }
        Action::SaveConversation => {
            store.save_current_conversation();
            Effect::None
        }
        Action::AutoSaveTick => {
            store.autosave();
            Effect::None
        }
        Action::InputChanged(text) => {
            store.set_user_input(text);
            Effect::None
        }
        Action::DismissError => {
            store.clear_error();
            Effect::None
        }
        Action::Failed(message) => {
            store.set_error(message);
            Effect::None
        }
        Action::LoggedIn => {
            store.set_authenticated(true);
            store.clear_error();
            Effect::None
        }
        Action::LoggedOut => {
            store.save_current_conversation();
            store.set_authenticated(false);
            Effect::PromptLogin
        }
        Action::RemoteHistoryLoaded(conversations) => {
            let added = store.merge_remote_conversations(conversations);
            info!("Merged {} conversations from the backend", added);
            Effect::None
        }
        Action::Quit => {
            store.save_current_conversation();
            Effect::Quit
        }
    }
}
