//! Wrapping and cursor geometry for the input box. Stateless helpers.

use unicode_width::UnicodeWidthStr;

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
pub(super) const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from area edge to content (border + padding)
pub(super) const CONTENT_OFFSET: u16 = 2;

pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

pub(super) fn inner_width(area_width: u16) -> u16 {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Wrapped line count, at least 1. A trailing newline opens a new line.
pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }

    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }
    count
}

/// (row, column) of the cursor at byte offset `pos` within the wrapped text.
pub(super) fn cursor_cell(text: &str, pos: usize, width: u16) -> (u16, u16) {
    let before = &text[..pos];
    if width == 0 || before.is_empty() {
        return (0, 0);
    }
    if before.ends_with('\n') {
        return (wrap_line_count(before, width) - 1, 0);
    }

    let lines = textwrap::wrap(before, wrap_options(width));
    let row = lines.len().saturating_sub(1) as u16;
    // textwrap drops trailing spaces from the last line
    let trailing = before.len() - before.trim_end_matches(' ').len();
    let col = lines.last().map(|l| l.width()).unwrap_or(0) + trailing;
    (row, (col as u16).min(width))
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_line_count() {
        assert_eq!(wrap_line_count("", 40), 1);
        assert_eq!(wrap_line_count("boots", 0), 1);
        assert_eq!(wrap_line_count("aaaaaaaaaa", 5), 2);
        assert_eq!(wrap_line_count("coat\n", 40), 2);
        assert_eq!(wrap_line_count("a\nb\nc", 40), 3);
    }

    #[test]
    fn test_cursor_cell_follows_wrapping() {
        assert_eq!(cursor_cell("", 0, 10), (0, 0));
        assert_eq!(cursor_cell("red ", 4, 10), (0, 4));
        assert_eq!(cursor_cell("aaaaaaaaaabb", 12, 10), (1, 2));
        assert_eq!(cursor_cell("top\n", 4, 10), (1, 0));
    }

    #[test]
    fn test_char_boundaries_multibyte() {
        let s = "café";
        assert_eq!(prev_char_boundary(s, 5), 3);
        assert_eq!(prev_char_boundary(s, 3), 2);
        assert_eq!(next_char_boundary(s, 2), 3);
        assert_eq!(next_char_boundary(s, 3), 5);
    }
}
