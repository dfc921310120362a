//! Frame layout.
//!
//! ```text
//! ┌ title bar ───────────────────────────────────────────┐
//! ├──────────┬───────────────────────────────────────────┤
//! │ sidebar  │ error banner (only while an error is set) │
//! │          │ message list                              │
//! │          │ input box                                 │
//! └──────────┴───────────────────────────────────────────┘
//! ```
//!
//! Overlays (product panel, then login) are drawn last, on top.

use chrono::Utc;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::core::store::ChatStore;
use crate::tui::component::Component;
use crate::tui::components::sidebar::SIDEBAR_WIDTH;
use crate::tui::components::{
    LoginOverlay, MessageList, ProductPanel, Sidebar, TitleBar,
};
use crate::tui::{Focus, TuiState};

/// Narrowest main column worth keeping when the sidebar is open.
const MIN_MAIN_WIDTH: u16 = 30;

pub fn draw_ui(frame: &mut Frame, store: &ChatStore, tui: &mut TuiState, spinner_frame: usize) {
    use Constraint::{Length, Min};

    let [title_area, body_area] = Layout::vertical([Length(1), Min(0)]).areas(frame.area());

    let mut title_bar = TitleBar::new(
        tui.base_url.as_str(),
        store.is_authenticated(),
        tui.status_message.as_str(),
    );
    title_bar.render(frame, title_area);

    let show_sidebar = store.is_sidebar_open() && body_area.width >= SIDEBAR_WIDTH + MIN_MAIN_WIDTH;
    let main_area = if show_sidebar {
        let [sidebar_area, main_area] =
            Layout::horizontal([Length(SIDEBAR_WIDTH), Min(0)]).areas(body_area);
        tui.sidebar.focused = tui.focus == Focus::Sidebar;
        Sidebar::new(
            &mut tui.sidebar,
            store.conversations(),
            store.current_conversation_id(),
            Utc::now(),
        )
        .render(frame, sidebar_area);
        main_area
    } else {
        body_area
    };

    let input_height = tui.input_box.calculate_height(main_area.width);
    let banner_height = if store.error().is_some() { 1 } else { 0 };
    let [banner_area, messages_area, input_area] =
        Layout::vertical([Length(banner_height), Min(0), Length(input_height)]).areas(main_area);

    if let Some(error) = store.error() {
        draw_error_banner(frame, banner_area, error);
    }

    MessageList::new(
        &mut tui.message_list,
        store.messages(),
        store.is_loading(),
        spinner_frame,
    )
    .render(frame, messages_area);

    tui.input_box.disabled = store.is_loading();
    tui.input_box.focused = tui.focus == Focus::Input && tui.overlay_hidden();
    tui.input_box.render(frame, input_area);

    let full = frame.area();
    if let Some(panel) = &tui.panel {
        ProductPanel::new(panel).render(frame, full);
    }
    if let Some(login) = &tui.login {
        LoginOverlay::new(login, &tui.base_url).render(frame, full);
    }
}

fn draw_error_banner(frame: &mut Frame, area: Rect, error: &str) {
    let line = Line::from(vec![
        Span::styled(
            format!(" ! {error} "),
            Style::default().fg(Color::White).bg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" Esc to dismiss", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
