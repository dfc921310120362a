//! # Core Application Logic
//!
//! Modista's business logic. It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • ChatStore (state)    │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    └─────┬─────────────┬─────┘
//!                          │             │
//!              ChatBackend │             │ Storage
//!                          ▼             ▼
//!                   ┌────────────┐ ┌────────────┐
//!                   │ ApiClient  │ │ FileStorage│
//!                   │ (reqwest)  │ │ (on disk)  │
//!                   └────────────┘ └────────────┘
//!                          ▲
//!                          │ Effects
//!                   ┌────────────┐
//!                   │    TUI     │
//!                   │  Adapter   │
//!                   │ (ratatui)  │
//!                   └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`conversation`]: messages, conversations and their ids
//! - [`store`]: `ChatStore`, the single source of truth for the chat UI
//! - [`action`]: the `Action` enum and the `update()` reducer
//! - [`backend`]: the `ChatBackend` seam the store sends through
//! - [`observer`]: change notifications for views
//! - [`autosave`]: periodic save timer
//! - [`storage`]: best-effort key/value persistence
//! - [`config`]: config file, env and CLI resolution

pub mod action;
pub mod autosave;
pub mod backend;
pub mod config;
pub mod conversation;
pub mod observer;
pub mod storage;
pub mod store;
