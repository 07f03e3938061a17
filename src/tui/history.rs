//! Price history view.

use super::state::HistoryView;
use super::Theme;
use crate::services::{DashboardSnapshot, PriceHistoryGenerator};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
    Frame,
};

/// Render the price history view.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    view: &mut HistoryView,
    generator: &PriceHistoryGenerator,
    snapshot: &DashboardSnapshot,
    theme: &Theme,
) {
    let Some(position) = view.selected(&snapshot.positions) else {
        let empty = Paragraph::new(Span::styled("No positions", theme.muted())).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Price History")
                .border_style(theme.border()),
        );
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let series = view.series(generator, position);
    let (low, high) = series
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        });
    let span = series
        .first()
        .zip(series.last())
        .map(|(a, b)| format!("{} to {}", a.date, b.date))
        .unwrap_or_default();

    let header = vec![
        Line::from(vec![
            Span::styled(position.symbol.clone(), theme.title()),
            Span::raw(format!("  {}", span)),
        ]),
        Line::from(vec![
            Span::styled("Low ", theme.muted()),
            Span::raw(format!("{:.2}", low)),
            Span::styled("  High ", theme.muted()),
            Span::raw(format!("{:.2}", high)),
            Span::styled("  Now ", theme.muted()),
            Span::raw(format!("{:.2}", position.current_price)),
            Span::styled("   Tab next  n regenerate", theme.muted()),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL).title("Price History")),
        chunks[0],
    );

    // sparkline wants u64, plot in cents above the low
    let data: Vec<u64> = series
        .iter()
        .map(|p| ((p.price - low) * 100.0).round().max(0.0) as u64)
        .collect();
    let sparkline = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Simulated daily close")
                .border_style(theme.border()),
        )
        .data(&data)
        .style(theme.info());
    frame.render_widget(sparkline, chunks[1]);
}

/// Handle keyboard events for the history view.
pub fn handle_event(key: &KeyEvent, view: &mut HistoryView, snapshot: &DashboardSnapshot) {
    match key.code {
        KeyCode::Tab => view.select_next(snapshot.positions.len()),
        KeyCode::Char('n') => view.regenerate(),
        _ => {}
    }
}
