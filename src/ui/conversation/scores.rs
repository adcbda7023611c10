use crate::view::ConversationView;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

/// Side panel with the latest metrics and evaluation
pub struct ScoresPanel<'a> {
    view: &'a ConversationView,
}

impl<'a> ScoresPanel<'a> {
    pub fn new(view: &'a ConversationView) -> Self {
        Self { view }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let heading = Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD);
        let mut lines = vec![Line::from(vec![Span::styled("Metrics", heading)])];

        if self.view.metric_lines.is_empty() {
            lines.push(Line::from(vec![Span::styled("none", Style::default().fg(Color::DarkGray))]));
        } else {
            lines.extend(self.view.metric_lines.iter().map(|metric| Line::from(metric.clone())));
        }

        lines.push(Line::default());
        lines.push(Line::from(vec![Span::styled("Evaluation", heading)]));
        match &self.view.evaluation {
            Some(evaluation) => lines.extend(evaluation.lines().map(|line| Line::from(line.to_string()))),
            None => lines.push(Line::from(vec![Span::styled("none", Style::default().fg(Color::DarkGray))])),
        }

        lines
    }
}

impl Widget for ScoresPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Scores");
        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
