//! # Sidebar Component
//!
//! Saved conversations, newest first. Toggled with Ctrl+B, focused with Tab.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState` (selection, delete confirmation)
//! - `Sidebar` is created each frame with borrowed state and the store's list
//!
//! Keys while focused: Up/Down select, Enter opens, `n` starts a new
//! conversation, `d` twice deletes, Esc hands focus back to the input box.

use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::core::conversation::{Conversation, ConversationId};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

pub const SIDEBAR_WIDTH: u16 = 34;

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarEvent {
    Load(ConversationId),
    CreateNew,
    Delete(ConversationId),
    /// Esc: give focus back to the input box
    Unfocus,
}

#[derive(Default)]
pub struct SidebarState {
    /// Ids in display order, refreshed by `sync` every loop iteration
    ids: Vec<ConversationId>,
    pub selected: usize,
    pub confirm_delete: bool,
    pub focused: bool,
    list_state: ListState,
}

impl SidebarState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track the store's current list, keeping the selection in range.
    pub fn sync(&mut self, conversations: &[Conversation]) {
        self.ids = conversations.iter().map(|c| c.id.clone()).collect();
        if self.ids.is_empty() {
            self.selected = 0;
            self.confirm_delete = false;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(self.ids.len() - 1);
            self.list_state.select(Some(self.selected));
        }
    }

    fn select(&mut self, index: usize) {
        self.selected = index;
        self.list_state.select(Some(index));
    }
}

impl EventHandler for SidebarState {
    type Event = SidebarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<SidebarEvent> {
        // Any other key cancels a pending delete
        if !matches!(event, TuiEvent::InputChar('d')) {
            self.confirm_delete = false;
        }

        match event {
            TuiEvent::Escape => Some(SidebarEvent::Unfocus),
            TuiEvent::CursorUp => {
                if !self.ids.is_empty() {
                    self.select(self.selected.saturating_sub(1));
                }
                None
            }
            TuiEvent::CursorDown => {
                if !self.ids.is_empty() {
                    self.select((self.selected + 1).min(self.ids.len() - 1));
                }
                None
            }
            TuiEvent::Submit => self.ids.get(self.selected).cloned().map(SidebarEvent::Load),
            TuiEvent::InputChar('n') => Some(SidebarEvent::CreateNew),
            TuiEvent::InputChar('d') => {
                let id = self.ids.get(self.selected)?.clone();
                if self.confirm_delete {
                    self.confirm_delete = false;
                    Some(SidebarEvent::Delete(id))
                } else {
                    self.confirm_delete = true;
                    None
                }
            }
            _ => None,
        }
    }
}

pub struct Sidebar<'a> {
    state: &'a mut SidebarState,
    conversations: &'a [Conversation],
    active: Option<&'a ConversationId>,
    now: DateTime<Utc>,
}

impl<'a> Sidebar<'a> {
    pub fn new(
        state: &'a mut SidebarState,
        conversations: &'a [Conversation],
        active: Option<&'a ConversationId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state,
            conversations,
            active,
            now,
        }
    }
}

impl<'a> Component for Sidebar<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let help = if self.state.confirm_delete {
            " d again to delete "
        } else if self.state.focused {
            " ⏎ open  n new  d del "
        } else {
            " Tab to browse "
        };
        let border = if self.state.focused { Color::Magenta } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::RIGHT | Borders::TOP | Borders::BOTTOM)
            .border_style(Style::default().fg(border))
            .title(format!(" Conversations ({} total) ", self.conversations.len()))
            .title_bottom(Line::from(help).centered())
            .padding(Padding::horizontal(1));

        if self.conversations.is_empty() {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from("No conversations yet"),
                Line::styled(
                    "Start chatting to see your history here",
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let title_width = area.width.saturating_sub(5) as usize; // border + padding + marker
        let items: Vec<ListItem> = self
            .conversations
            .iter()
            .enumerate()
            .map(|(i, conversation)| {
                let is_active = self.active == Some(&conversation.id);
                let is_selected = self.state.focused && i == self.state.selected;

                let mut title_style = if is_active {
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                if is_selected {
                    title_style = title_style.add_modifier(Modifier::REVERSED);
                    if self.state.confirm_delete {
                        title_style = title_style.fg(Color::Red);
                    }
                }
                let marker = if is_active { "▌" } else { " " };
                let meta = format!(
                    "  {} · {} messages",
                    format_relative(conversation.last_updated, self.now),
                    conversation.message_count
                );

                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(marker, Style::default().fg(Color::Magenta)),
                        Span::styled(truncate(&conversation.title, title_width), title_style),
                    ]),
                    Line::styled(meta, Style::default().fg(Color::DarkGray)),
                ])
            })
            .collect();

        frame.render_stateful_widget(List::new(items).block(block), area, &mut self.state.list_state);
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago", then a calendar date after a week.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    match minutes {
        m if m < 1 => "Just now".to_string(),
        m if m < 60 => format!("{m}m ago"),
        m if m < 60 * 24 => format!("{}h ago", m / 60),
        m if m < 60 * 24 * 7 => format!("{}d ago", m / (60 * 24)),
        _ => then.with_timezone(&Local).format("%b %d, %Y").to_string(),
    }
}

/// Cut `text` to `max_width` display columns, ending in "..." when shortened.
fn truncate(text: &str, max_width: usize) -> String {
    let width: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if width <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max_width - 3 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Message;
    use chrono::Duration;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn conversations(ids: &[&str]) -> Vec<Conversation> {
        ids.iter()
            .map(|id| Conversation::snapshot(ConversationId::from(*id), vec![Message::user(format!("about {id}"))]))
            .collect()
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now - Duration::seconds(20), now), "Just now");
        assert_eq!(format_relative(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative(now - Duration::hours(3), now), "3h ago");
        assert_eq!(format_relative(now - Duration::days(2), now), "2d ago");
        let old = now - Duration::days(30);
        assert_eq!(
            format_relative(old, now),
            old.with_timezone(&Local).format("%b %d, %Y").to_string()
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long conversation title", 10), "a long ...");
        assert_eq!(truncate("abcdef", 2), "..");
    }

    #[test]
    fn test_navigation_and_load() {
        let list = conversations(&["a", "b", "c"]);
        let mut state = SidebarState::new();
        state.sync(&list);

        state.handle_event(&TuiEvent::CursorDown);
        state.handle_event(&TuiEvent::CursorDown);
        state.handle_event(&TuiEvent::CursorDown);
        assert_eq!(state.selected, 2);

        state.handle_event(&TuiEvent::CursorUp);
        assert_eq!(
            state.handle_event(&TuiEvent::Submit),
            Some(SidebarEvent::Load(ConversationId::from("b")))
        );
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let list = conversations(&["a", "b"]);
        let mut state = SidebarState::new();
        state.sync(&list);

        assert_eq!(state.handle_event(&TuiEvent::InputChar('d')), None);
        assert!(state.confirm_delete);
        // Moving away cancels
        state.handle_event(&TuiEvent::CursorDown);
        assert!(!state.confirm_delete);

        state.handle_event(&TuiEvent::InputChar('d'));
        assert_eq!(
            state.handle_event(&TuiEvent::InputChar('d')),
            Some(SidebarEvent::Delete(ConversationId::from("b")))
        );
    }

    #[test]
    fn test_sync_clamps_selection() {
        let mut state = SidebarState::new();
        state.sync(&conversations(&["a", "b", "c"]));
        state.handle_event(&TuiEvent::CursorDown);
        state.handle_event(&TuiEvent::CursorDown);

        state.sync(&conversations(&["a"]));
        assert_eq!(state.selected, 0);

        state.sync(&[]);
        assert_eq!(state.handle_event(&TuiEvent::Submit), None);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('d')), None);
        assert_eq!(state.handle_event(&TuiEvent::InputChar('n')), Some(SidebarEvent::CreateNew));
        assert_eq!(state.handle_event(&TuiEvent::Escape), Some(SidebarEvent::Unfocus));
    }

    #[test]
    fn test_render_lists_titles_and_counts() {
        let list = conversations(&["a", "b"]);
        let active = list[1].id.clone();
        let mut state = SidebarState::new();
        state.sync(&list);

        let backend = TestBackend::new(SIDEBAR_WIDTH, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                Sidebar::new(&mut state, &list, Some(&active), Utc::now()).render(f, area);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();

        assert!(text.contains("Conversations (2 total)"));
        assert!(text.contains("about a"));
        assert!(text.contains("Just now · 1 messages"));
    }

    #[test]
    fn test_render_empty_state() {
        let mut state = SidebarState::new();
        let backend = TestBackend::new(SIDEBAR_WIDTH, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                Sidebar::new(&mut state, &[], None, Utc::now()).render(f, area);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("No conversations yet"));
    }
}
