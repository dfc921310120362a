//! # TitleBar Component
//!
//! One-line header: app name, backend address, login state and a status text.
//!
//! Purely presentational. All fields are props set by the parent each frame:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar::new(client.base_url(), store.is_authenticated(), status);
//! title_bar.render(frame, title_area);
//! ```
//!
//! On narrow terminals the status is dropped first, then the address.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::Component;

const APP_NAME: &str = "Modista";

pub struct TitleBar {
    pub base_url: String,
    pub authenticated: bool,
    /// Transient status (e.g. "Searching...", "Saved"). Empty = none.
    pub status_message: String,
}

impl TitleBar {
    pub fn new(base_url: impl Into<String>, authenticated: bool, status_message: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            authenticated,
            status_message: status_message.into(),
        }
    }

    fn line(&self, width: u16) -> Line<'static> {
        let sep = Span::styled(" | ", Style::default().fg(Color::DarkGray));
        let name = Span::styled(
            APP_NAME,
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        );
        let login = if self.authenticated {
            Span::styled("signed in", Style::default().fg(Color::Green))
        } else {
            Span::styled("signed out", Style::default().fg(Color::Yellow))
        };
        let address = Span::styled(self.base_url.clone(), Style::default().fg(Color::Gray));
        let status = Span::raw(self.status_message.clone());

        let full = vec![
            name.clone(),
            sep.clone(),
            address.clone(),
            sep.clone(),
            login.clone(),
            sep.clone(),
            status,
        ];
        let without_status = vec![name.clone(), sep.clone(), address, sep.clone(), login.clone()];
        let minimal = vec![name, sep, login];

        let fits = |spans: &[Span]| spans.iter().map(|s| s.content.width()).sum::<usize>() <= width as usize;

        let spans = if !self.status_message.is_empty() && fits(&full) {
            full
        } else if fits(&without_status) {
            without_status
        } else {
            minimal
        };
        Line::from(spans)
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(area.width), area);
    }
}
