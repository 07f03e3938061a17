//! Loan management view.

use super::dashboard::money;
use super::state::{LoanFeedback, LoanForm};
use super::Theme;
use crate::services::{DashboardSnapshot, LoanManager};
use crate::types::LoanAction;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the loan management view.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    form: &LoanForm,
    snapshot: &DashboardSnapshot,
    loans: &LoanManager,
    theme: &Theme,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let (loan, headroom) = match &snapshot.margin_status {
        Some(status) => (status.loan_amount(), loans.max_loan_increase(status)),
        None => (0.0, 0.0),
    };
    let amount = form.amount();
    let increase_allowed = matches!(amount, Some(a) if a > 0.0 && a <= headroom);
    let pay_allowed = matches!(amount, Some(a) if a > 0.0 && a <= loan);

    let action_style = |allowed: bool| {
        if allowed && !form.is_pending() {
            theme.info()
        } else {
            theme.muted()
        }
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("Current Loan: ", theme.muted()),
            Span::raw(money(loan)),
        ]),
        Line::from(vec![
            Span::styled("Max Additional: ", theme.muted()),
            Span::styled(money(headroom.max(0.0)), theme.signed(headroom)),
        ]),
        Line::from(vec![
            Span::styled("Amount: ", theme.muted()),
            Span::styled(format!("${}_", form.input()), theme.title()),
        ]),
        Line::from(vec![
            Span::styled("[p] ", action_style(pay_allowed)),
            Span::styled(LoanAction::Pay.label(), action_style(pay_allowed)),
            Span::raw("   "),
            Span::styled("[i] ", action_style(increase_allowed)),
            Span::styled(LoanAction::Increase.label(), action_style(increase_allowed)),
        ]),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Loan (client {})", loans.client_id()))
                .border_style(theme.border()),
        ),
        chunks[0],
    );

    let result = match (&form.pending, &form.feedback) {
        (Some(action), _) => Line::from(Span::styled(
            format!("{}: submitting...", action.label()),
            theme.info(),
        )),
        (None, Some(LoanFeedback::Success {
            action,
            message,
            new_loan_amount,
        })) => Line::from(Span::styled(
            format!(
                "{}: {}. New loan {}",
                action.label(),
                message,
                money(*new_loan_amount)
            ),
            theme.success(),
        )),
        (None, Some(LoanFeedback::Failure { action, message })) => Line::from(Span::styled(
            format!("{} failed: {}", action.label(), message),
            theme.error(),
        )),
        (None, None) => Line::from(Span::styled(
            "Type an amount, then p to pay or i to borrow more",
            theme.muted(),
        )),
    };
    frame.render_widget(
        Paragraph::new(result)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Result")
                    .border_style(theme.border()),
            ),
        chunks[1],
    );
}

/// Edit the amount; returns the action to submit, if any.
pub fn handle_event(key: &KeyEvent, form: &mut LoanForm) -> Option<LoanAction> {
    match key.code {
        KeyCode::Char('p') => Some(LoanAction::Pay),
        KeyCode::Char('i') => Some(LoanAction::Increase),
        KeyCode::Char(c) => {
            form.push_char(c);
            None
        }
        KeyCode::Backspace => {
            form.backspace();
            None
        }
        _ => None,
    }
}
