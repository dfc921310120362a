//! # MessageList Component
//!
//! Scrollable view of the active conversation.
//!
//! `MessageList` is a transient component (created each frame) that wraps
//! `&'a mut MessageListState` (persistent state) and the store's messages
//! (props). Heights are measured before rendering so the `ScrollView` canvas
//! can be sized up front.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ ╭ Modista · 14:02 ───────╮   │  assistant bubbles hug the left
//! │ ╰────────────────────────╯   │
//! │     ╭ You · 14:03 ─────────╮ │  user bubbles hug the right
//! │     ╰──────────────────────╯ │
//! │ Modista is typing...         │  while a reply is pending
//! └──────────────────────────────┘
//! ```

use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect, Size};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::conversation::Message;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::MessageBubble;
use crate::tui::event::TuiEvent;

const WELCOME: &[&str] = &[
    "Welcome to Modista",
    "",
    "Ask about outfits, trends, sizes or a product you have in mind.",
    "Try: \"Show me trending jeans for under fifty dollars\"",
    "",
    "/help lists commands",
];
const SPINNER: &[&str] = &[".  ", ".. ", "...", " ..", "  .", "   "];
/// Rows reserved under the last bubble for the typing indicator.
const TYPING_ROWS: u16 = 1;
/// Share of the width a bubble may take; the rest is the indent on the other side.
const BUBBLE_PERCENT: u16 = 85;

/// Scroll state for the message list. Persisted in `TuiState`.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    /// When true, auto-scroll to bottom on new content
    pub stick_to_bottom: bool,
    /// Heights measured on the last render, one per message
    pub heights: Vec<u16>,
    /// Last known viewport height (for scroll clamping between frames)
    pub viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        Self {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true,
            heights: Vec::new(),
            viewport_height: 0,
        }
    }

    fn content_height(&self) -> u16 {
        self.heights.iter().sum()
    }

    fn max_offset(&self) -> u16 {
        self.content_height().saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    pub fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Re-engage auto-scroll once the user scrolls back to the bottom.
    pub fn repin_if_at_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y >= max_y {
            self.stick_to_bottom = true;
            self.scroll_state.set_offset(Position { x: current.x, y: max_y });
        }
    }

    /// Forget layout and jump to the bottom, e.g. after switching conversations.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl EventHandler for MessageListState {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<()> {
        match event {
            TuiEvent::ScrollUp => {
                self.stick_to_bottom = false;
                self.scroll_state.scroll_up();
            }
            TuiEvent::ScrollPageUp => {
                self.stick_to_bottom = false;
                self.scroll_state.scroll_page_up();
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.repin_if_at_bottom();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.repin_if_at_bottom();
            }
            _ => return None,
        }
        Some(())
    }
}

pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub messages: &'a [Message],
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [Message],
        is_loading: bool,
        spinner_frame: usize,
    ) -> Self {
        Self {
            state,
            messages,
            is_loading,
            spinner_frame,
        }
    }

    fn render_welcome(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = WELCOME
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let style = if i == 0 {
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                Line::styled(*text, style)
            })
            .collect();
        let height = (lines.len() as u16).min(area.height);
        let top = area.y + area.height.saturating_sub(height) / 2;
        let centered = Rect::new(area.x, top, area.width, height);
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), centered);
    }
}

/// Width of a bubble at `content_width`.
pub fn bubble_width(content_width: u16) -> u16 {
    (content_width * BUBBLE_PERCENT / 100).max(content_width.min(20))
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.messages.is_empty() && !self.is_loading {
            self.state.heights.clear();
            self.render_welcome(frame, area);
            return;
        }

        let content_width = area.width.saturating_sub(1); // -1 for scrollbar
        let width = bubble_width(content_width);

        self.state.heights = self
            .messages
            .iter()
            .map(|m| MessageBubble::calculate_height(m, width))
            .collect();
        let typing_rows = if self.is_loading { TYPING_ROWS } else { 0 };
        let canvas_height = self.state.content_height() + typing_rows;

        self.state.viewport_height = area.height;
        if !self.state.stick_to_bottom {
            self.state.clamp_scroll();
        }

        let mut scroll_view = ScrollView::new(Size::new(content_width, canvas_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Automatic)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y: u16 = 0;
        for (message, height) in self.messages.iter().zip(&self.state.heights) {
            let x = if message.is_user() {
                content_width.saturating_sub(width)
            } else {
                0
            };
            scroll_view.render_widget(MessageBubble::new(message), Rect::new(x, y, width, *height));
            y += height;
        }

        if self.is_loading {
            let dots = SPINNER[self.spinner_frame % SPINNER.len()];
            let typing = Paragraph::new(format!(" Modista is typing{dots}")).style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            );
            scroll_view.render_widget(typing, Rect::new(0, y, content_width, TYPING_ROWS));
        }

        if self.state.stick_to_bottom {
            self.state.scroll_state.scroll_to_bottom();
        }
        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}
