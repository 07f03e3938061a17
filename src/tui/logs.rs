//! Logs view.

use super::state::LogBuffer;
use super::Theme;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

const VISIBLE_LINES: usize = 200;

/// Render the logs view.
pub fn render(frame: &mut Frame, area: Rect, buffer: &LogBuffer, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Logs (c to clear)")
        .border_style(theme.border());

    let lines = buffer.recent(VISIBLE_LINES);
    if lines.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No logs yet.", theme.muted())),
        ];
        frame.render_widget(Paragraph::new(text).block(block).centered(), area);
        return;
    }

    let items: Vec<ListItem> = lines
        .iter()
        .rev()
        .map(|line| {
            let style = if line.contains("ERROR") {
                theme.error()
            } else if line.contains("WARN") {
                theme.warning()
            } else if line.contains("INFO") {
                theme.success()
            } else if line.contains("DEBUG") {
                theme.muted()
            } else {
                theme.info()
            };

            ListItem::new(Line::from(Span::styled(line.clone(), style)))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Handle keyboard events for the logs view.
pub fn handle_event(key: &KeyEvent, buffer: &LogBuffer) {
    if key.code == KeyCode::Char('c') {
        buffer.clear();
    }
}
