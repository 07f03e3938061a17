//! Scenario simulator view.

use super::dashboard::money;
use super::state::SimulatorState;
use super::Theme;
use crate::services::{DashboardSnapshot, HealthLevel, ScenarioEngine};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const LOAN_STEP: f64 = 1_000.0;

/// Render the scenario simulator view.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    sim: &SimulatorState,
    snapshot: &DashboardSnapshot,
    engine: &ScenarioEngine,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    let breakeven = engine
        .breakeven_change_percent(&snapshot.positions, &sim.input.target, sim.input.loan_amount)
        .map(|pct| format!("{:+.2}%", pct))
        .unwrap_or_else(|| "n/a".to_string());

    let inputs = vec![
        Line::from(vec![
            Span::styled("Market Change: ", theme.muted()),
            Span::styled(
                format!("{:+.0}%", sim.input.market_change_percent),
                theme.signed(sim.input.market_change_percent),
            ),
            Span::styled(format!("  (±{:.0}%)", sim.shock_limit_pct()), theme.muted()),
        ]),
        Line::from(vec![
            Span::styled("Target: ", theme.muted()),
            Span::styled(sim.input.target.to_string(), theme.title()),
        ]),
        Line::from(vec![
            Span::styled("Loan: ", theme.muted()),
            Span::raw(money(sim.input.loan_amount)),
        ]),
        Line::from(vec![
            Span::styled("Margin call at: ", theme.muted()),
            Span::styled(breakeven, theme.warning()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "←/→ change  ↑/↓ loan  Tab target  Enter run  x reset",
            theme.muted(),
        )),
    ];
    frame.render_widget(
        Paragraph::new(inputs).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Scenario")
                .border_style(theme.border()),
        ),
        top[0],
    );

    let results = match &sim.result {
        None => vec![Line::from(Span::styled(
            "Press Enter to simulate",
            theme.muted(),
        ))],
        Some(result) => {
            let status = &result.status;
            let level = HealthLevel::classify(status);
            vec![
                Line::from(vec![
                    Span::styled("Status: ", theme.muted()),
                    Span::styled(level.label(), theme.health(level)),
                ]),
                Line::from(vec![
                    Span::styled("Portfolio Value: ", theme.muted()),
                    Span::raw(money(status.portfolio_market_value())),
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
            ]
        }
    };
    frame.render_widget(
        Paragraph::new(results).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Simulated Margin")
                .border_style(theme.border()),
        ),
        top[1],
    );

    let rows: Vec<Row> = sim
        .result
        .iter()
        .flat_map(|r| r.adjusted_positions.iter())
        .map(|pos| {
            Row::new(vec![
                Cell::from(pos.symbol.clone()).style(theme.title()),
                Cell::from(format!("{:.2}", pos.quantity)),
                Cell::from(format!("{:.2}", pos.current_price)),
                Cell::from(money(pos.market_value)),
            ])
        })
        .collect();
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(16),
        ],
    )
    .header(Row::new(vec!["Symbol", "Qty", "Price", "Value"]).style(theme.header()))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Adjusted Positions")
            .border_style(theme.border()),
    );
    frame.render_widget(table, chunks[1]);
}

/// Handle keyboard events for the simulator view.
pub fn handle_event(
    key: &KeyEvent,
    sim: &mut SimulatorState,
    snapshot: &DashboardSnapshot,
    engine: &ScenarioEngine,
) {
    match key.code {
        KeyCode::Left => sim.nudge_change(-1.0),
        KeyCode::Right => sim.nudge_change(1.0),
        KeyCode::Up => sim.nudge_loan(LOAN_STEP),
        KeyCode::Down => sim.nudge_loan(-LOAN_STEP),
        KeyCode::Tab => {
            let symbols: Vec<String> = snapshot.positions.iter().map(|p| p.symbol.clone()).collect();
            sim.cycle_target(&symbols);
        }
        KeyCode::Enter => {
            sim.run(engine, &snapshot.positions);
        }
        KeyCode::Char('x') => sim.reset(snapshot.margin_status.as_ref()),
        _ => {}
    }
}
