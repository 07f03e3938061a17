//! Dashboard view - margin status, portfolio summary and positions.

use super::Theme;
use crate::services::{
    health_percentage, DashboardSnapshot, DataOrigin, HealthLevel, PortfolioAggregator,
};
use crate::types::MarginStatus;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

/// Render the dashboard view.
pub fn render(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let Some(status) = &snapshot.margin_status else {
        let waiting = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("Loading account data...", theme.muted())),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Dashboard")
                .border_style(theme.border()),
        )
        .centered();
        frame.render_widget(waiting, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(10), // Margin + summary
            Constraint::Length(3), // Health gauge
            Constraint::Min(0),    // Positions
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    render_margin_status(frame, top[0], status, snapshot.origin, theme);
    render_summary(frame, top[1], snapshot, theme);
    render_health(frame, chunks[1], status, theme);
    render_positions(frame, chunks[2], snapshot, theme);
}

pub(super) fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", value.abs())
    } else {
        format!("${:.2}", value)
    }
}

fn render_margin_status(
    frame: &mut Frame,
    area: Rect,
    status: &MarginStatus,
    origin: Option<DataOrigin>,
    theme: &Theme,
) {
    let level = HealthLevel::classify(status);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Status: ", theme.muted()),
            Span::styled(level.label(), theme.health(level)),
        ]),
        Line::from(vec![
            Span::styled("Portfolio Value: ", theme.muted()),
            Span::raw(money(status.portfolio_market_value())),
        ]),
        Line::from(vec![
            Span::styled("Loan: ", theme.muted()),
            Span::raw(money(status.loan_amount())),
        ]),
        Line::from(vec![
            Span::styled("Net Equity: ", theme.muted()),
            Span::styled(money(status.net_equity()), theme.signed(status.net_equity())),
        ]),
        Line::from(vec![
            Span::styled("Requirement: ", theme.muted()),
            Span::raw(money(status.margin_requirement())),
        ]),
        Line::from(vec![
            Span::styled("Shortfall: ", theme.muted()),
            Span::styled(
                money(status.margin_shortfall()),
                if status.margin_call_triggered() {
                    theme.error()
                } else {
                    theme.success()
                },
            ),
        ]),
        Line::from(vec![
            Span::styled("Buffer: ", theme.muted()),
            Span::raw(money(status.buffer_before_call())),
        ]),
    ];
    match origin {
        Some(DataOrigin::Cached) => {
            lines.push(Line::from(Span::styled("Showing last fetched data", theme.warning())))
        }
        Some(DataOrigin::Fallback) => {
            lines.push(Line::from(Span::styled("Showing demo data", theme.warning())))
        }
        _ => {}
    }

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Margin Status")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_summary(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let summary = PortfolioAggregator::summarize(&snapshot.positions);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total Cost: ", theme.muted()),
            Span::raw(money(summary.total_cost)),
        ]),
        Line::from(vec![
            Span::styled("Total Value: ", theme.muted()),
            Span::raw(money(summary.total_value)),
        ]),
        Line::from(vec![
            Span::styled("Gain/Loss: ", theme.muted()),
            Span::styled(
                format!(
                    "{} ({:+.2}%)",
                    money(summary.total_gain_loss),
                    summary.total_gain_loss_percent
                ),
                theme.signed(summary.total_gain_loss),
            ),
        ]),
    ];
    if let Some(best) = &summary.best_position {
        lines.push(Line::from(vec![
            Span::styled("Best: ", theme.muted()),
            Span::styled(
                format!("{} {:+.2}%", best.symbol, best.gain_loss_percent),
                theme.signed(best.gain_loss_percent),
            ),
        ]));
    }
    if let Some(worst) = &summary.worst_position {
        lines.push(Line::from(vec![
            Span::styled("Worst: ", theme.muted()),
            Span::styled(
                format!("{} {:+.2}%", worst.symbol, worst.gain_loss_percent),
                theme.signed(worst.gain_loss_percent),
            ),
        ]));
    }

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Portfolio")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_health(frame: &mut Frame, area: Rect, status: &MarginStatus, theme: &Theme) {
    let level = HealthLevel::classify(status);
    let health = health_percentage(status);
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Margin Health"))
        .gauge_style(theme.health(level))
        .percent(health.round() as u16)
        .label(format!("{:.0}% buffer above requirement", health));
    frame.render_widget(gauge, area);
}

/// Render the positions table.
fn render_positions(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let weights = PortfolioAggregator::composition(&snapshot.positions);

    let rows: Vec<Row> = snapshot
        .positions
        .iter()
        .zip(weights.iter())
        .map(|(pos, slice)| {
            let gain = match pos.gain_loss_percent() {
                Some(pct) => Cell::from(format!("{:+.2}%", pct)).style(theme.signed(pct)),
                None => Cell::from("n/a").style(theme.muted()),
            };
            Row::new(vec![
                Cell::from(pos.symbol.clone()).style(theme.title()),
                Cell::from(format!("{:.2}", pos.quantity)),
                Cell::from(format!("{:.2}", pos.cost_basis)),
                Cell::from(format!("{:.2}", pos.current_price)),
                Cell::from(money(pos.market_value)),
                gain,
                Cell::from(format!("{:.1}%", slice.weight_percent)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(8),
    ];
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Symbol", "Qty", "Cost", "Price", "Value", "G/L", "Weight"])
                .style(theme.header()),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Positions")
                .border_style(theme.border()),
        );
    frame.render_widget(table, area);
}
