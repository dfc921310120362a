//! # Product Panel
//!
//! Read-only overlay for slash-command results: product search, trending
//! items, the shopping profile and the help list. Esc or Enter closes it.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Clear, Padding, Paragraph, Wrap};

use crate::api::Product;
use crate::api::types::{PreferencesResponse, ProductSearchResponse, TrendingResponse};
use crate::tui::command::HELP_LINES;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::format_product;
use crate::tui::components::overlay::centered_rect;
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPanelState {
    pub title: String,
    /// Free text shown above the products (summaries, suggestions)
    pub notes: Vec<String>,
    pub products: Vec<Product>,
    pub scroll: u16,
}

impl ProductPanelState {
    pub fn new(title: impl Into<String>, notes: Vec<String>, products: Vec<Product>) -> Self {
        Self {
            title: title.into(),
            notes,
            products,
            scroll: 0,
        }
    }

    pub fn from_search(query: &str, response: ProductSearchResponse) -> Self {
        let mut notes = vec![format!(
            "{} match{} for \"{}\"",
            response.total_count,
            if response.total_count == 1 { "" } else { "es" },
            query
        )];
        if !response.suggestions.is_empty() {
            notes.push(format!("Try also: {}", response.suggestions.join(", ")));
        }
        Self::new(" Search ", notes, response.products)
    }

    pub fn from_trending(response: TrendingResponse) -> Self {
        let scope = response.category.as_deref().unwrap_or("all categories");
        let notes = vec![format!(
            "{} trending in {} ({})",
            response.total_trending, scope, response.timeframe
        )];
        Self::new(" Trending ", notes, response.trending_products)
    }

    pub fn from_preferences(response: PreferencesResponse) -> Self {
        let prefs = &response.preferences;
        let mut notes = Vec::new();
        if let Some(message) = &response.message {
            notes.push(message.clone());
        }
        notes.push(format!(
            "{} orders, ${:.2} spent",
            prefs.total_orders, prefs.total_spent
        ));
        if !prefs.favorite_categories.is_empty() {
            let names: Vec<String> = prefs
                .favorite_categories
                .iter()
                .map(|c| format!("{} ({})", c.name, c.count))
                .collect();
            notes.push(format!("Categories: {}", names.join(", ")));
        }
        if !prefs.favorite_brands.is_empty() {
            let names: Vec<String> = prefs
                .favorite_brands
                .iter()
                .map(|b| format!("{} ({})", b.name, b.count))
                .collect();
            notes.push(format!("Brands: {}", names.join(", ")));
        }
        if let Some(range) = &prefs.price_range {
            notes.push(format!(
                "Typical price: ${:.2} to ${:.2}, avg ${:.2}",
                range.min, range.max, range.avg
            ));
        }
        if !response.recommendations.is_empty() {
            notes.push("Recommended for you:".to_string());
        }
        Self::new(" Your Profile ", notes, response.recommendations)
    }

    pub fn help() -> Self {
        let notes = HELP_LINES.iter().map(|l| l.to_string()).collect();
        Self::new(" Commands ", notes, Vec::new())
    }

    fn line_count(&self) -> u16 {
        let products = if self.products.is_empty() { 0 } else { self.products.len() + 1 };
        (self.notes.len() + products) as u16
    }
}

impl EventHandler for ProductPanelState {
    type Event = PanelEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<PanelEvent> {
        match event {
            TuiEvent::Escape | TuiEvent::Submit => Some(PanelEvent::Close),
            TuiEvent::CursorUp | TuiEvent::ScrollUp => {
                self.scroll = self.scroll.saturating_sub(1);
                None
            }
            TuiEvent::CursorDown | TuiEvent::ScrollDown => {
                self.scroll = (self.scroll + 1).min(self.line_count().saturating_sub(1));
                None
            }
            _ => None,
        }
    }
}

pub struct ProductPanel<'a> {
    state: &'a ProductPanelState,
}

impl<'a> ProductPanel<'a> {
    pub fn new(state: &'a ProductPanelState) -> Self {
        Self { state }
    }
}

impl<'a> Component for ProductPanel<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let overlay = centered_rect(80, 70, area);
        frame.render_widget(Clear, overlay);

        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Magenta))
            .title(self.state.title.as_str())
            .title_bottom(Line::from(" ↑↓ scroll  Esc close ").centered())
            .padding(Padding::horizontal(1));

        let mut lines: Vec<Line> = self
            .state
            .notes
            .iter()
            .map(|n| Line::styled(n.as_str(), Style::default().fg(Color::Gray)))
            .collect();
        if !self.state.products.is_empty() {
            lines.push(Line::default());
            for product in &self.state.products {
                let detail = [product.category.as_str(), product.department.as_str()]
                    .iter()
                    .filter(|s| !s.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" / ");
                let mut text = format!("• {}", format_product(product));
                if !detail.is_empty() {
                    text.push_str(&format!("  [{detail}]"));
                }
                lines.push(Line::styled(text, Style::default().fg(Color::Yellow)));
            }
        } else if self.state.notes.is_empty() {
            lines.push(Line::styled(
                "Nothing to show",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }

        let panel = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.state.scroll, 0));
        frame.render_widget(panel, overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{NamedCount, Preferences};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn product(name: &str) -> Product {
        Product {
            id: name.to_string(),
            name: name.to_string(),
            brand: "Acme".to_string(),
            category: "Jeans".to_string(),
            department: "Women".to_string(),
            retail_price: 40.0,
            sku: String::new(),
        }
    }

    fn rendered(state: &ProductPanelState) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                ProductPanel::new(state).render(f, area);
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_search_summary() {
        let response = ProductSearchResponse {
            products: vec![product("Slim Jeans")],
            total_count: 1,
            suggestions: vec!["denim".to_string()],
        };
        let state = ProductPanelState::from_search("jeans", response);
        assert_eq!(state.notes[0], "1 match for \"jeans\"");
        assert_eq!(state.notes[1], "Try also: denim");

        let text = rendered(&state);
        assert!(text.contains("Search"));
        assert!(text.contains("• Slim Jeans (Acme) - $40.00  [Jeans / Women]"));
    }

    #[test]
    fn test_preferences_summary() {
        let response = PreferencesResponse {
            message: None,
            preferences: Preferences {
                favorite_categories: vec![NamedCount {
                    name: "Jeans".to_string(),
                    count: 3,
                }],
                favorite_brands: Vec::new(),
                price_range: None,
                total_orders: 4,
                total_spent: 180.5,
            },
            recommendations: vec![product("Wide Leg")],
        };
        let state = ProductPanelState::from_preferences(response);
        assert_eq!(state.notes[0], "4 orders, $180.50 spent");
        assert_eq!(state.notes[1], "Categories: Jeans (3)");
        assert_eq!(state.notes.last().map(String::as_str), Some("Recommended for you:"));
    }

    #[test]
    fn test_help_lists_commands() {
        let state = ProductPanelState::help();
        assert!(rendered(&state).contains("/search <query>"));
    }

    #[test]
    fn test_scroll_is_bounded_and_escape_closes() {
        let mut state = ProductPanelState::new(" T ", vec!["a".into(), "b".into()], Vec::new());
        state.handle_event(&TuiEvent::CursorUp);
        assert_eq!(state.scroll, 0);
        for _ in 0..5 {
            state.handle_event(&TuiEvent::CursorDown);
        }
        assert_eq!(state.scroll, 1);
        assert_eq!(state.handle_event(&TuiEvent::Escape), Some(PanelEvent::Close));
        assert_eq!(state.handle_event(&TuiEvent::InputChar('q')), None);
    }
}
