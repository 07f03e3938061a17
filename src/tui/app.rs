//! Main TUI application logic.

use super::state::{HistoryView, LoanFeedback, LoanForm, LogBuffer, SimulatorState};
use super::{dashboard, events, history, loan, logs, simulator, Route, Theme};
use crate::services::{
    DashboardSnapshot, LoadState, LoanManager, PriceHistoryGenerator, RefreshCommander,
    RefreshRequester, ScenarioEngine,
};
use crate::types::LoanAction;
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// Everything the TUI needs from the rest of the application.
pub struct TuiContext {
    pub snapshots: watch::Receiver<DashboardSnapshot>,
    pub commander: RefreshCommander,
    pub engine: ScenarioEngine,
    pub loans: Arc<LoanManager>,
    pub history: PriceHistoryGenerator,
    pub shock_limit_pct: f64,
    pub log_buffer: Arc<LogBuffer>,
}

/// Main TUI application.
pub struct App {
    current_route: Route,
    ctx: TuiContext,
    theme: Theme,
    should_quit: bool,
    snapshot: DashboardSnapshot,
    simulator: SimulatorState,
    loan_form: LoanForm,
    history_view: HistoryView,
    loan_results_tx: mpsc::UnboundedSender<LoanFeedback>,
    loan_results_rx: mpsc::UnboundedReceiver<LoanFeedback>,
}

impl App {
    pub fn new(ctx: TuiContext) -> Self {
        let (loan_results_tx, loan_results_rx) = mpsc::unbounded_channel();
        let snapshot = ctx.snapshots.borrow().clone();
        let simulator = SimulatorState::new(ctx.shock_limit_pct);
        Self {
            current_route: Route::Dashboard,
            ctx,
            theme: Theme::default(),
            should_quit: false,
            snapshot,
            simulator,
            loan_form: LoanForm::default(),
            history_view: HistoryView::default(),
            loan_results_tx,
            loan_results_rx,
        }
    }

    pub fn route(&self) -> Route {
        self.current_route
    }

    /// Pull the latest published snapshot and finished loan operations.
    pub fn sync(&mut self) {
        self.snapshot = self.ctx.snapshots.borrow_and_update().clone();
        if let Some(status) = &self.snapshot.margin_status {
            self.simulator.sync_live(&self.snapshot.positions, status);
        }

        while let Ok(feedback) = self.loan_results_rx.try_recv() {
            let succeeded = matches!(feedback, LoanFeedback::Success { .. });
            self.loan_form.finish(feedback);
            if succeeded {
                self.request_refresh();
            }
        }
    }

    fn request_refresh(&self) {
        if let Err(e) = self.ctx.commander.request_refresh() {
            warn!("Could not request refresh: {}", e);
        }
    }

    pub fn handle_event(&mut self, event: events::Event) {
        let key = match event {
            events::Event::Key(key) => key,
            events::Event::Tick | events::Event::Resize(_, _) => return,
        };

        if events::is_quit(&key) {
            self.should_quit = true;
            return;
        }

        if events::is_key(&key, KeyCode::Char('r')) {
            self.request_refresh();
            return;
        }
        if events::is_key(&key, KeyCode::Char('a')) {
            if let Err(e) = self.ctx.commander.dismiss_alert() {
                warn!("Could not dismiss alert: {}", e);
            }
            return;
        }

        for route in Route::all() {
            if events::is_key(&key, KeyCode::Char(route.key())) {
                self.current_route = route;
                return;
            }
        }

        match self.current_route {
            Route::Dashboard => {}
            Route::Simulator => simulator::handle_event(
                &key,
                &mut self.simulator,
                &self.snapshot,
                &self.ctx.engine,
            ),
            Route::Loan => {
                if let Some(action) = loan::handle_event(&key, &mut self.loan_form) {
                    self.submit_loan(action);
                }
            }
            Route::History => history::handle_event(&key, &mut self.history_view, &self.snapshot),
            Route::Logs => logs::handle_event(&key, &self.ctx.log_buffer),
        }
    }

    /// Validate locally, then run the operation in the background. The
    /// result arrives through `sync`.
    fn submit_loan(&mut self, action: LoanAction) {
        if self.loan_form.is_pending() {
            return;
        }
        let Some(status) = self.snapshot.margin_status.clone() else {
            self.loan_form.finish(LoanFeedback::Failure {
                action,
                message: "No margin status loaded yet".to_string(),
            });
            return;
        };
        let amount = self.loan_form.amount().unwrap_or(0.0);
        if let Err(e) = self.ctx.loans.validate(action, amount, &status) {
            self.loan_form.finish(LoanFeedback::Failure {
                action,
                message: e.to_string(),
            });
            return;
        }

        self.loan_form.pending = Some(action);
        let loans = self.ctx.loans.clone();
        let tx = self.loan_results_tx.clone();
        tokio::spawn(async move {
            let feedback = match loans.submit(action, amount, &status).await {
                Ok(response) => LoanFeedback::Success {
                    action,
                    message: response.message,
                    new_loan_amount: response.new_loan_amount,
                },
                Err(e) => LoanFeedback::Failure {
                    action,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(feedback);
        });
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let alerting = self.snapshot.is_alerting();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),                           // Tabs
                Constraint::Length(if alerting { 3 } else { 0 }), // Alert banner
                Constraint::Min(0),                              // Content
                Constraint::Length(3),                           // Status bar
            ])
            .split(area);

        self.render_tabs(frame, chunks[0]);
        if alerting {
            self.render_alert(frame, chunks[1]);
        }

        let theme = &self.theme;
        let snapshot = &self.snapshot;
        match self.current_route {
            Route::Dashboard => dashboard::render(frame, chunks[2], snapshot, theme),
            Route::Simulator => simulator::render(
                frame,
                chunks[2],
                &self.simulator,
                snapshot,
                &self.ctx.engine,
                theme,
            ),
            Route::Loan => loan::render(
                frame,
                chunks[2],
                &self.loan_form,
                snapshot,
                &self.ctx.loans,
                theme,
            ),
            Route::History => history::render(
                frame,
                chunks[2],
                &mut self.history_view,
                &self.ctx.history,
                snapshot,
                theme,
            ),
            Route::Logs => logs::render(frame, chunks[2], &self.ctx.log_buffer, theme),
        }

        self.render_status_bar(frame, chunks[3]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let routes = Route::all();
        let titles: Vec<Line> = routes
            .iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(format!("[{}] ", r.key()), self.theme.muted()),
                    Span::raw(r.name()),
                ])
            })
            .collect();

        let selected = routes
            .iter()
            .position(|r| *r == self.current_route)
            .unwrap_or(0);

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Margin Monitor"))
            .select(selected)
            .style(self.theme.tab_inactive())
            .highlight_style(self.theme.tab_active());

        frame.render_widget(tabs, area);
    }

    fn render_alert(&self, frame: &mut Frame, area: Rect) {
        let shortfall = self
            .snapshot
            .margin_status
            .as_ref()
            .map(|s| s.margin_shortfall())
            .unwrap_or(0.0);
        let banner = Paragraph::new(Line::from(vec![
            Span::styled(
                format!(" MARGIN CALL: shortfall ${:.2} ", shortfall),
                self.theme.alert(),
            ),
            Span::raw("  "),
            Span::styled("[a]", self.theme.muted()),
            Span::raw(" acknowledge"),
        ]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.error()),
        );
        frame.render_widget(banner, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (state_label, state_style) = match self.snapshot.load_state {
            LoadState::Idle => ("○ Idle", self.theme.muted()),
            LoadState::Loading => ("◌ Loading", self.theme.info()),
            LoadState::Ready => ("● Live", self.theme.success()),
            LoadState::Degraded => ("● Degraded", self.theme.warning()),
        };
        let updated = self
            .snapshot
            .last_updated
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());

        let mut spans = vec![
            Span::styled(state_label, state_style),
            Span::raw(" | updated "),
            Span::styled(updated, self.theme.info()),
        ];
        if let Some(error) = &self.snapshot.error {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(error.clone(), self.theme.error()));
        }
        spans.extend([
            Span::raw(" | "),
            Span::styled("r", self.theme.muted()),
            Span::raw(" refresh "),
            Span::styled("q", self.theme.muted()),
            Span::raw(" quit"),
        ]);

        let bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.border()),
        );
        frame.render_widget(bar, area);
    }
}

/// Run the TUI until the user quits.
pub async fn run_tui(ctx: TuiContext) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ctx);
    let mut event_handler = events::EventHandler::new(Duration::from_millis(250));

    let result = loop {
        app.sync();
        if let Err(e) = terminal.draw(|f| app.render(f)) {
            break Err(e);
        }

        match event_handler.next().await {
            Some(event) => app.handle_event(event),
            None => break Ok(()),
        }

        if app.should_quit() {
            break Ok(());
        }
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
