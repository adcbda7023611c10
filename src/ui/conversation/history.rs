//! Conversation history display component

use crate::message::Role;
use crate::view::{Alignment, Bubble, ConversationView};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Draws the bubbles of a [`ConversationView`], newest at the bottom
pub struct ConversationHistory<'a> {
    view: &'a ConversationView,
    title: String,
    /// Frame counter driving the typing dots
    tick: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(view: &'a ConversationView, title: impl Into<String>, tick: usize) -> Self {
        Self {
            view,
            title: title.into(),
            tick,
        }
    }

    /// Lay every bubble out into styled, positioned lines
    fn layout_lines(&self, width: u16) -> Vec<(u16, Line<'static>)> {
        let mut lines = Vec::new();

        for bubble in &self.view.bubbles {
            lines.extend(self.bubble_lines(bubble, width));
            lines.push((0, Line::default()));
        }

        if let Some(typing) = &self.view.typing {
            let dots = ".".repeat(self.tick % 4);
            let text = format!("{}{dots}", typing.trim_end_matches('.'));
            let offset = centered_offset(width, char_width(&text));
            lines.push((
                offset,
                Line::from(vec![Span::styled(
                    text,
                    Style::default().fg(Color::Blue).add_modifier(Modifier::ITALIC),
                )]),
            ));
        }

        lines
    }

    fn bubble_lines(&self, bubble: &Bubble, width: u16) -> Vec<(u16, Line<'static>)> {
        let max_width = bubble_width(bubble.role, width);
        let wrapped = wrap_text(&bubble.text, max_width as usize);
        let block_width = wrapped
            .iter()
            .map(|line| char_width(line))
            .max()
            .unwrap_or(0);

        let offset = match bubble.alignment {
            Alignment::Leading => 0,
            Alignment::Trailing => width.saturating_sub(block_width),
            Alignment::Centered => centered_offset(width, block_width),
        };

        let style = content_style(bubble.role);
        wrapped
            .into_iter()
            .map(|text| (offset, Line::from(vec![Span::styled(text, style)])))
            .collect()
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title(self.title.as_str());
        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        if self.view.bubbles.is_empty() && self.view.typing.is_none() {
            let welcome_lines = [
                Line::from(vec![Span::styled(
                    "Start a conversation!",
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                )]),
                Line::from(vec![Span::styled(
                    "Type a question below and press Enter. /help lists commands.",
                    Style::default().fg(Color::Gray),
                )]),
            ];
            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let all_lines = self.layout_lines(inner_area.width);

        // keep the newest lines visible
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);

        for (i, (offset, line)) in all_lines[start..].iter().enumerate() {
            let x = inner_area.x + offset;
            let width = inner_area.width.saturating_sub(*offset);
            buf.set_line(x, inner_area.y + i as u16, line, width);
        }
    }
}

fn bubble_width(role: Role, width: u16) -> u16 {
    let percent = match role {
        Role::User => 60,
        Role::Assistant => 75,
        Role::System => 90,
    };
    (width as u32 * percent / 100).max(1) as u16
}

fn char_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}

fn centered_offset(width: u16, content_width: u16) -> u16 {
    width.saturating_sub(content_width) / 2
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::White).bg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::White).bg(Color::DarkGray),
        Role::System => Style::default().fg(Color::Yellow),
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks.
/// Words longer than the width are split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                lines.push(word.drain(..width).collect());
            }

            let separator = usize::from(current_len > 0);
            if current_len + separator + word.len() > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.extend(word.iter());
            current_len += word.len();
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}
