//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Data Flow
//!
//! ```text
//! key press ──► Controller::handle_event ──► update(store, Action) ──► Effect
//!                                                                       │
//!   ┌───────────────────────────────────────────────────────────────────┘
//!   ▼
//! tokio task (ApiClient call) ──► mpsc::Sender<Background> ──► handle_background
//! ```
//!
//! ## Redraw Strategy
//!
//! The store notifies a subscription whenever state changes, which sets a
//! dirty flag. While a reply is pending the loop redraws every ~80ms for the
//! typing indicator; otherwise it sleeps up to 500ms and only redraws on
//! events, background results or store changes.

mod command;
mod component;
mod components;
mod event;
mod ui;

use log::{debug, info, warn};
use std::future::Future;
use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;

use crate::api::types::ProductSearchParams;
use crate::api::{ApiClient, ApiError};
use crate::core::action::{Action, Effect, update};
use crate::core::autosave::AutoSaveTimer;
use crate::core::config::ResolvedConfig;
use crate::core::conversation::{Conversation, ConversationId};
use crate::core::storage::Storage;
use crate::core::store::{ChatStore, PendingSend, SAVE_DELAY};
use crate::tui::command::Command;
use crate::tui::component::EventHandler;
use crate::tui::components::{
    InputBox, InputEvent, LoginEvent, LoginState, MessageListState, PanelEvent, ProductPanelState,
    SidebarEvent, SidebarState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

/// Which pane receives keystrokes when no overlay is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Sidebar,
}

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub base_url: String,
    /// Prefill for the login overlay
    pub username: Option<String>,
    pub status_message: String,
    // Persistent component states
    pub message_list: MessageListState,
    pub input_box: InputBox,
    pub sidebar: SidebarState,
    pub focus: Focus,
    // Overlays (None = hidden)
    pub login: Option<LoginState>,
    pub panel: Option<ProductPanelState>,
}

impl TuiState {
    pub fn new(base_url: impl Into<String>, username: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username,
            status_message: String::new(),
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            sidebar: SidebarState::new(),
            focus: Focus::Input, // User expects to type immediately
            login: None,
            panel: None,
        }
    }

    pub fn overlay_hidden(&self) -> bool {
        self.login.is_none() && self.panel.is_none()
    }
}

/// Results delivered from background tasks to the event loop.
#[derive(Debug)]
pub enum Background {
    Core(Action),
    LoginFailed(String),
    ShowPanel(ProductPanelState),
}

/// Owns the store and the presentation state, and turns events and effects
/// into store updates and background tasks.
pub struct Controller {
    pub store: ChatStore,
    pub tui: TuiState,
    client: Arc<ApiClient>,
    tx: mpsc::Sender<Background>,
}

impl Controller {
    pub fn new(
        mut store: ChatStore,
        client: Arc<ApiClient>,
        tx: mpsc::Sender<Background>,
        config: &ResolvedConfig,
    ) -> Self {
        store.set_authenticated(client.is_authenticated());
        store.set_sidebar_open(config.sidebar_open);
        let tui = TuiState::new(client.base_url(), config.username.clone());
        let mut controller = Self {
            store,
            tui,
            client,
            tx,
        };
        if !controller.store.is_authenticated() {
            controller.apply(Effect::PromptLogin);
        }
        controller
    }

    fn dispatch(&mut self, action: Action) -> bool {
        let effect = update(&mut self.store, action);
        self.apply(effect)
    }

    /// Start the I/O an effect asks for. Returns true when the app should quit.
    fn apply(&mut self, effect: Effect) -> bool {
        match effect {
            Effect::None => {}
            Effect::SpawnSend(pending) => self.spawn_send(pending),
            Effect::ScheduleSave => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(SAVE_DELAY).await;
                    send(&tx, Background::Core(Action::SaveConversation));
                });
            }
            Effect::PromptLogin => {
                if self.tui.login.is_none() {
                    let mut login = LoginState::new(self.tui.username.clone());
                    login.error = self.store.error().map(str::to_string);
                    self.tui.login = Some(login);
                }
                self.tui.panel = None;
            }
            Effect::Quit => return true,
        }
        false
    }

    /// Route one terminal event. Returns true when the app should quit.
    pub fn handle_event(&mut self, event: TuiEvent) -> bool {
        self.tui.sidebar.sync(self.store.conversations());

        match event {
            TuiEvent::Resize => return false,
            TuiEvent::ForceQuit => return self.dispatch(Action::Quit),
            _ => {}
        }

        // Overlays take every key while open
        if let Some(login) = &mut self.tui.login {
            return match login.handle_event(&event) {
                Some(LoginEvent::Submit { username, password }) => {
                    self.spawn_login(username, password);
                    false
                }
                Some(LoginEvent::Quit) => self.dispatch(Action::Quit),
                None => false,
            };
        }
        if let Some(panel) = &mut self.tui.panel {
            if panel.handle_event(&event) == Some(PanelEvent::Close) {
                self.tui.panel = None;
            }
            return false;
        }

        match event {
            TuiEvent::ToggleSidebar => {
                self.dispatch(Action::ToggleSidebar);
                if !self.store.is_sidebar_open() {
                    self.tui.focus = Focus::Input;
                }
                return false;
            }
            TuiEvent::NewConversation => return self.new_conversation(),
            TuiEvent::ScrollUp
            | TuiEvent::ScrollDown
            | TuiEvent::ScrollPageUp
            | TuiEvent::ScrollPageDown => {
                self.tui.message_list.handle_event(&event);
                return false;
            }
            TuiEvent::FocusNext => {
                self.tui.focus = match self.tui.focus {
                    Focus::Input if self.store.is_sidebar_open() => Focus::Sidebar,
                    _ => Focus::Input,
                };
                return false;
            }
            TuiEvent::Escape if self.store.error().is_some() => {
                return self.dispatch(Action::DismissError);
            }
            _ => {}
        }

        match self.tui.focus {
            Focus::Sidebar => match self.tui.sidebar.handle_event(&event) {
                Some(SidebarEvent::Load(id)) => {
                    self.tui.message_list.reset();
                    self.tui.focus = Focus::Input;
                    self.dispatch(Action::LoadConversation(id))
                }
                Some(SidebarEvent::CreateNew) => {
                    self.tui.focus = Focus::Input;
                    self.new_conversation()
                }
                Some(SidebarEvent::Delete(id)) => {
                    let quit = self.dispatch(Action::DeleteConversation(id));
                    if self.store.current_conversation_id().is_none() {
                        self.tui.message_list.reset();
                    }
                    quit
                }
                Some(SidebarEvent::Unfocus) => {
                    self.tui.focus = Focus::Input;
                    false
                }
                None => false,
            },
            Focus::Input => match self.tui.input_box.handle_event(&event) {
                Some(InputEvent::Submit(text)) => self.submit(text),
                Some(InputEvent::ContentChanged) => {
                    let text = self.tui.input_box.text().to_string();
                    self.dispatch(Action::InputChanged(text))
                }
                None => false,
            },
        }
    }

    /// Apply a result from a background task. Returns true when the app should quit.
    pub fn handle_background(&mut self, message: Background) -> bool {
        debug!("Event loop received: {:?}", message);
        self.tui.status_message.clear();
        match message {
            Background::Core(Action::LoggedIn) => {
                self.tui.login = None;
                self.tui.status_message = "Signed in".to_string();
                self.dispatch(Action::LoggedIn)
            }
            Background::Core(Action::RemoteHistoryLoaded(conversations)) => {
                let before = self.store.conversations_count();
                let quit = self.dispatch(Action::RemoteHistoryLoaded(conversations));
                let added = self.store.conversations_count() - before;
                self.tui.status_message = format!("History synced, {added} new");
                quit
            }
            Background::Core(action) => self.dispatch(action),
            Background::LoginFailed(error) => {
                if let Some(login) = &mut self.tui.login {
                    login.fail(error);
                }
                false
            }
            Background::ShowPanel(panel) => {
                self.tui.panel = Some(panel);
                false
            }
        }
    }

    fn new_conversation(&mut self) -> bool {
        self.tui.message_list.reset();
        self.tui.input_box.clear();
        self.dispatch(Action::NewConversation)
    }

    fn submit(&mut self, text: String) -> bool {
        match command::parse(&text) {
            Some(Ok(command)) => self.run_command(command),
            Some(Err(e)) => self.dispatch(Action::Failed(e.to_string())),
            None => {
                self.tui.message_list.stick_to_bottom = true;
                let effect = update(&mut self.store, Action::Submit(text.clone()));
                if effect == Effect::PromptLogin {
                    // Keep the draft for after login
                    self.tui.input_box.set_text(text);
                }
                self.apply(effect)
            }
        }
    }

    fn run_command(&mut self, command: Command) -> bool {
        info!("Running command {:?}", command);
        match command {
            Command::New => return self.new_conversation(),
            Command::Help => self.tui.panel = Some(ProductPanelState::help()),
            Command::Logout => {
                self.client.logout();
                return self.dispatch(Action::LoggedOut);
            }
            Command::Search(params) => {
                let client = self.client.clone();
                let query = search_label(&params);
                self.spawn_query(
                    "Searching...",
                    async move { client.search_products(&params).await },
                    move |response| Background::ShowPanel(ProductPanelState::from_search(&query, response)),
                );
            }
            Command::Trending(params) => {
                let client = self.client.clone();
                self.spawn_query(
                    "Loading trends...",
                    async move { client.trending_products(&params).await },
                    |response| Background::ShowPanel(ProductPanelState::from_trending(response)),
                );
            }
            Command::Prefs => {
                let client = self.client.clone();
                self.spawn_query(
                    "Loading profile...",
                    async move { client.user_preferences().await },
                    |response| Background::ShowPanel(ProductPanelState::from_preferences(response)),
                );
            }
            Command::History => {
                let client = self.client.clone();
                self.spawn_query(
                    "Syncing history...",
                    async move { fetch_history(&client).await },
                    |conversations| Background::Core(Action::RemoteHistoryLoaded(conversations)),
                );
            }
        }
        false
    }

    fn spawn_send(&self, pending: PendingSend) {
        info!("Spawning chat request");
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = client
                .send_chat_message(&pending.text, pending.backend_conversation_id())
                .await;
            send(&tx, Background::Core(Action::ResponseReceived { pending, result }));
        });
    }

    fn spawn_login(&self, username: String, password: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let message = match client.authenticate(&username, &password).await {
                Ok(_) => Background::Core(Action::LoggedIn),
                Err(e) => Background::LoginFailed(e.to_string()),
            };
            send(&tx, message);
        });
    }

    /// Run a read-only backend call, mapping its result to a `Background` message.
    fn spawn_query<T, Fut, Done>(&mut self, status: &str, request: Fut, done: Done)
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
        Done: FnOnce(T) -> Background + Send + 'static,
    {
        self.tui.status_message = status.to_string();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let message = match request.await {
                Ok(value) => done(value),
                // Tokens are gone at this point; ask for a fresh login
                Err(e) if e.is_auth() => Background::Core(Action::LoggedOut),
                Err(e) => Background::Core(Action::Failed(e.to_string())),
            };
            send(&tx, message);
        });
    }
}

fn send(tx: &mpsc::Sender<Background>, message: Background) {
    if tx.send(message).is_err() {
        warn!("Failed to deliver background result: receiver dropped");
    }
}

fn search_label(params: &ProductSearchParams) -> String {
    params.q.clone().unwrap_or_default()
}

/// List remote conversations, fetching full message history for any the
/// list endpoint returned without messages.
async fn fetch_history(client: &ApiClient) -> Result<Vec<Conversation>, ApiError> {
    let list = client.conversation_history().await?;
    info!("Backend reports {} conversations", list.total_count);

    let mut conversations = Vec::with_capacity(list.conversations.len());
    for remote in list.conversations {
        let remote = if remote.messages.is_empty() {
            let id = ConversationId::from(remote.id.clone());
            match client.conversation_details(&id).await {
                Ok(details) => details,
                Err(e) => {
                    warn!("Could not load conversation {}: {}", id, e);
                    remote
                }
            }
        } else {
            remote
        };
        conversations.push(remote.into_conversation());
    }
    Ok(conversations)
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets us tell Shift+Enter from Enter;
        // terminals without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

pub fn run(config: ResolvedConfig, storage: Arc<dyn Storage>) -> std::io::Result<()> {
    let client = Arc::new(ApiClient::new(config.base_url.clone(), storage.clone()));
    let store = ChatStore::new(storage);

    // Channel for results from background tasks
    let (tx, rx) = mpsc::channel();
    let mut app = Controller::new(store, client, tx.clone(), &config);

    let dirty = Arc::new(AtomicBool::new(true));
    let flag = dirty.clone();
    let subscription = app
        .store
        .subscribe(Box::new(move |_event| flag.store(true, Ordering::Relaxed)));

    let autosave_tx = tx.clone();
    let autosave = AutoSaveTimer::start(config.autosave_interval, move || {
        autosave_tx
            .send(Background::Core(Action::AutoSaveTick))
            .is_ok()
    });

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    let result = event_loop(&mut terminal, &mut app, &rx, &dirty);

    autosave.stop();
    app.store.unsubscribe(subscription);
    app.store.save_current_conversation();
    ratatui::restore();
    info!("Modista shutting down");
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    app: &mut Controller,
    rx: &mpsc::Receiver<Background>,
    dirty: &AtomicBool,
) -> std::io::Result<()> {
    let start_time = Instant::now();
    let mut needs_redraw = true;

    loop {
        let animating = app.store.is_loading();
        if animating || dirty.swap(false, Ordering::Relaxed) {
            needs_redraw = true;
        }

        if needs_redraw {
            app.tui.sidebar.sync(app.store.conversations());
            let spinner_frame = (start_time.elapsed().as_secs_f32() * 12.0) as usize;
            terminal.draw(|f| ui::draw_ui(f, &app.store, &mut app.tui, spinner_frame))?;
            needs_redraw = false;
        }

        // Short timeout while the typing indicator animates, long when idle
        let timeout = if animating {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(500)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Drain all pending events before the next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if app.handle_event(event) {
                return Ok(());
            }
        }

        while let Ok(message) = rx.try_recv() {
            needs_redraw = true;
            if app.handle_background(message) {
                return Ok(());
            }
        }
    }
}
