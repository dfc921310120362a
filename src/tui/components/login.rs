//! # Login Overlay
//!
//! Shown over the chat whenever the store is signed out. Two fields,
//! Tab/Up/Down to switch, Enter on the password field submits.
//!
//! The overlay never talks to the backend itself: it emits
//! `LoginEvent::Submit` and the event loop runs `ApiClient::authenticate`,
//! then reports back through `set_error` or by closing the overlay.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::components::overlay::centered_fixed;
use crate::tui::event::TuiEvent;

const WIDTH: u16 = 48;
const HEIGHT: u16 = 11;
const LABEL_WIDTH: u16 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum LoginEvent {
    Submit { username: String, password: String },
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

pub struct LoginState {
    pub username: String,
    password: String,
    pub field: LoginField,
    pub error: Option<String>,
    /// True while an authenticate call is in flight
    pub busy: bool,
}

impl LoginState {
    /// Prefills the username (from config) and focuses whichever field is still empty.
    pub fn new(username: Option<String>) -> Self {
        let username = username.unwrap_or_default();
        let field = if username.is_empty() {
            LoginField::Username
        } else {
            LoginField::Password
        };
        Self {
            username,
            password: String::new(),
            field,
            error: None,
            busy: false,
        }
    }

    /// Backend rejected the credentials: show why and let the user retry.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.busy = false;
        self.password.clear();
        self.field = LoginField::Password;
    }

    fn active(&mut self) -> &mut String {
        match self.field {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    fn switch_field(&mut self) {
        self.field = match self.field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}

impl EventHandler for LoginState {
    type Event = LoginEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<LoginEvent> {
        if matches!(event, TuiEvent::Escape) {
            return Some(LoginEvent::Quit);
        }
        if self.busy {
            return None;
        }

        match event {
            TuiEvent::InputChar('\n') => None,
            TuiEvent::InputChar(c) => {
                self.active().push(*c);
                None
            }
            TuiEvent::Paste(text) => {
                // Single-line fields
                let line = text.lines().next().unwrap_or_default().to_string();
                self.active().push_str(&line);
                None
            }
            TuiEvent::Backspace => {
                self.active().pop();
                None
            }
            TuiEvent::FocusNext | TuiEvent::CursorUp | TuiEvent::CursorDown => {
                self.switch_field();
                None
            }
            TuiEvent::Submit => {
                if self.field == LoginField::Username {
                    self.field = LoginField::Password;
                    return None;
                }
                let username = self.username.trim().to_string();
                if username.is_empty() || self.password.is_empty() {
                    self.error = Some("Enter a username and password".to_string());
                    return None;
                }
                self.error = None;
                self.busy = true;
                Some(LoginEvent::Submit {
                    username,
                    password: self.password.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Transient render wrapper.
pub struct LoginOverlay<'a> {
    state: &'a LoginState,
    base_url: &'a str,
}

impl<'a> LoginOverlay<'a> {
    pub fn new(state: &'a LoginState, base_url: &'a str) -> Self {
        Self { state, base_url }
    }

    fn field_line(&self, label: &'static str, value: String, field: LoginField) -> Line<'static> {
        let focused = self.state.field == field && !self.state.busy;
        let label_style = if focused {
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Line::from(vec![
            Span::styled(format!("{label:<width$}", width = LABEL_WIDTH as usize), label_style),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    }
}

impl<'a> Component for LoginOverlay<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_fixed(WIDTH, HEIGHT, area);
        frame.render_widget(Clear, overlay);

        let help = if self.state.busy {
            " Signing in... "
        } else {
            " ⏎ sign in  Tab switch  Esc quit "
        };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Sign in to Modista ")
            .title_bottom(Line::from(help).centered())
            .padding(Padding::new(2, 2, 1, 0));
        let inner = block.inner(overlay);
        frame.render_widget(block, overlay);

        let [server_area, _, user_area, pass_area, _, error_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new(self.base_url).style(Style::default().fg(Color::DarkGray)),
            server_area,
        );
        frame.render_widget(
            self.field_line("Username", self.state.username.clone(), LoginField::Username),
            user_area,
        );
        let masked = "•".repeat(self.state.password.chars().count());
        frame.render_widget(self.field_line("Password", masked, LoginField::Password), pass_area);

        if let Some(error) = &self.state.error {
            frame.render_widget(
                Paragraph::new(error.as_str())
                    .style(Style::default().fg(Color::Red))
                    .wrap(ratatui::widgets::Wrap { trim: true }),
                error_area,
            );
        }

        if !self.state.busy {
            let (row, text) = match self.state.field {
                LoginField::Username => (user_area, self.state.username.width()),
                LoginField::Password => (pass_area, self.state.password.chars().count()),
            };
            let col = (LABEL_WIDTH + text as u16).min(row.width.saturating_sub(1));
            frame.set_cursor_position((row.x + col, row.y));
        }
    }
}
