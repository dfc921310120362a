use chrono::Local;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Padding, Paragraph, Widget, Wrap};

use crate::api::Product;
use crate::core::conversation::{Message, Sender};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

/// One chat bubble: sender and `HH:MM` in the border, text inside, and a
/// product card per recommended product under assistant replies.
///
/// Transient: built each frame by `MessageList` from a borrowed message.
#[derive(Clone, Copy)]
pub struct MessageBubble<'a> {
    pub message: &'a Message,
}

impl<'a> MessageBubble<'a> {
    pub fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// Height this bubble needs at `width`, predicted with the same wrapping
    /// rules `Paragraph` uses so the list can lay out without rendering.
    pub fn calculate_height(message: &Message, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }

        let text_lines = wrapped_lines(message.content.trim(), content_width).max(1);
        let product_lines: u16 = if message.products.is_empty() {
            0
        } else {
            // Blank separator line, then one card per product
            1 + message
                .products
                .iter()
                .map(|p| wrapped_lines(&format_product(p), content_width).max(1))
                .sum::<u16>()
        };
        text_lines + product_lines + VERTICAL_OVERHEAD
    }
}

fn wrapped_lines(text: &str, width: u16) -> u16 {
    if text.is_empty() {
        return 0;
    }
    let options = textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace);
    textwrap::wrap(text, options).len() as u16
}

/// `Slim Jeans (Levi's) - $49.99`
pub fn format_product(product: &Product) -> String {
    if product.brand.trim().is_empty() {
        format!("{} - ${:.2}", product.name, product.retail_price)
    } else {
        format!("{} ({}) - ${:.2}", product.name, product.brand, product.retail_price)
    }
}

pub fn format_clock(message: &Message) -> String {
    message.timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

impl<'a> Widget for MessageBubble<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let (who, style) = match self.message.sender {
            Sender::User => ("You", Style::default().fg(Color::Cyan)),
            Sender::Assistant => ("Modista", Style::default().fg(Color::Magenta)),
        };
        let title = format!(" {} · {} ", who, format_clock(self.message));

        let block = Block::bordered()
            .title(title)
            .border_type(BorderType::Rounded)
            .border_style(style.add_modifier(Modifier::DIM))
            .title_style(style)
            .padding(Padding::horizontal(CONTENT_PAD_H));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = self
            .message
            .content
            .trim()
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        if !self.message.products.is_empty() {
            lines.push(Line::default());
            let card_style = Style::default().fg(Color::Yellow);
            for product in &self.message.products {
                lines.push(Line::from(Span::styled(format_product(product), card_style)));
            }
        }

        Paragraph::new(lines)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}

impl<'a> Component for MessageBubble<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}
