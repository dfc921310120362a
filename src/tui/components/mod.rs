//! # TUI Components
//!
//! ## Component Architecture
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Receive all data as props each frame:
//! - `TitleBar`: app name, backend address, login state, status text
//! - `MessageBubble`: one chat message with its product cards
//!
//! ### Stateful Components (Event-Driven)
//!
//! Own persistent state that lives in `TuiState` and emit high-level events:
//! - `InputBox`: message and slash-command entry
//! - `MessageList`: scrollable conversation with a typing indicator
//! - `Sidebar`: saved conversations (load, new, delete)
//! - `LoginOverlay`: credentials form shown while signed out
//! - `ProductPanel`: results of `/search`, `/trending`, `/prefs`, `/help`
//!
//! Stateful components split into a persistent `FooState` and a transient
//! `Foo<'a>` built each frame that borrows the state plus store data:
//!
//! ```rust,ignore
//! Sidebar::new(&mut tui.sidebar, store.conversations(), store.current_conversation_id(), now)
//!     .render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs            (this file)
//! ├── title_bar.rs
//! ├── message.rs        (single bubble)
//! ├── message_list.rs
//! ├── input_box/
//! ├── sidebar.rs
//! ├── login.rs
//! ├── product_panel.rs
//! └── overlay.rs        (centering helpers)
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod input_box;
pub mod message;
pub use input_box::{InputBox, InputEvent};
pub mod message_list;
pub use message_list::{MessageList, MessageListState};
pub mod login;
pub mod overlay;
pub mod product_panel;
pub mod sidebar;
pub use login::{LoginEvent, LoginOverlay, LoginState};
pub use product_panel::{PanelEvent, ProductPanel, ProductPanelState};
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
