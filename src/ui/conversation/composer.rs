use crate::ui::conversation::commands::{command_entries, parse_slash_command, SlashCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(SlashCommand),
    None,
}

/// Single-line draft editor. The cursor is a char index, not a byte index.
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    content: String,
    cursor: usize,
    placeholder: String,
    enabled: bool,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            placeholder: placeholder.into(),
            enabled: true,
        }
    }

    /// Handle key input. Editing keys are ignored while disabled.
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => return self.submit(),
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.content.remove(self.byte_index());
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_count() {
                    self.content.remove(self.byte_index());
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_count(),
            KeyCode::Esc => self.clear(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text, flattening newlines into spaces
    pub fn paste(&mut self, text: &str) {
        if !self.enabled {
            return;
        }
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
    }

    fn submit(&mut self) -> ComposerResult {
        if self.content.trim().is_empty() {
            return ComposerResult::None;
        }

        if let Some(command) = parse_slash_command(&self.content) {
            self.clear();
            return ComposerResult::Command(command);
        }

        // the draft stays visible until the turn settles
        ComposerResult::Submitted(self.content.clone())
    }

    fn insert_char(&mut self, c: char) {
        let index = self.byte_index();
        self.content.insert(index, c);
        self.cursor += 1;
    }

    fn byte_index(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Commands matching a partially typed `/word`
    fn command_hint(&self) -> Option<String> {
        let query = self.content.strip_prefix('/')?;
        if query.contains(char::is_whitespace) {
            return None;
        }
        let matches: Vec<String> = command_entries()
            .iter()
            .filter(|entry| entry.keyword.starts_with(query))
            .map(|entry| format!("/{} - {}", entry.keyword, entry.description))
            .collect();
        (!matches.is_empty()).then(|| matches.join("   "))
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.enabled { "Message" } else { "Message (waiting for reply)" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(if self.enabled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::DarkGray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height == 0 || inner_area.width == 0 {
            return;
        }

        if self.content.is_empty() {
            let placeholder = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.enabled {
                content.insert(self.byte_index(), '▌');
            }
            let line = Line::from(vec![Span::raw(content)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if let Some(hint) = self.command_hint() {
            if area.y > 0 {
                let line = Line::from(vec![Span::styled(hint, Style::default().fg(Color::Cyan))]);
                buf.set_line(area.x, area.y - 1, &line, area.width);
            }
        }
    }
}
