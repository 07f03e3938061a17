//! View state for the TUI and log buffering.

use crate::services::{PriceHistoryGenerator, ScenarioEngine};
use crate::types::{
    LoanAction, MarginStatus, Position, PricePoint, ScenarioInput, ScenarioResult, ScenarioTarget,
};
use std::collections::{HashMap, VecDeque};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log buffer for the TUI.
pub struct LogBuffer {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl LogBuffer {
    /// Create a new log buffer with a fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Push a line, dropping the oldest past capacity.
    pub fn push_line(&self, line: String) {
        let mut lines = self.lock();
        lines.push_back(line);
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Get the most recent lines, up to limit.
    pub fn recent(&self, limit: usize) -> Vec<String> {
        let lines = self.lock();
        let start = lines.len().saturating_sub(limit);
        lines.iter().skip(start).cloned().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Writer that buffers log lines for the TUI.
pub struct LogWriter {
    buffer: Arc<LogBuffer>,
    line: Vec<u8>,
}

impl LogWriter {
    fn take_line(&mut self) {
        if !self.line.is_empty() {
            let line = String::from_utf8_lossy(&self.line).to_string();
            self.buffer.push_line(line);
            self.line.clear();
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &b in buf {
            if b == b'\n' {
                self.take_line();
            } else {
                self.line.push(b);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.take_line();
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        self.take_line();
    }
}

/// MakeWriter for tracing subscriber that writes into LogBuffer.
pub struct LogMakeWriter {
    buffer: Arc<LogBuffer>,
}

impl LogMakeWriter {
    pub fn new(buffer: Arc<LogBuffer>) -> Self {
        Self { buffer }
    }
}

impl<'a> MakeWriter<'a> for LogMakeWriter {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            buffer: self.buffer.clone(),
            line: Vec::new(),
        }
    }
}

/// Scenario simulator inputs and last result.
#[derive(Debug, Clone)]
pub struct SimulatorState {
    pub input: ScenarioInput,
    pub result: Option<ScenarioResult>,
    shock_limit_pct: f64,
    live: Option<(Vec<Position>, MarginStatus)>,
}

impl SimulatorState {
    pub fn new(shock_limit_pct: f64) -> Self {
        Self {
            input: ScenarioInput::new(0.0),
            result: None,
            shock_limit_pct,
            live: None,
        }
    }

    pub fn shock_limit_pct(&self) -> f64 {
        self.shock_limit_pct
    }

    /// Track the live data the scenario is based on. Any change to it
    /// discards the inputs and result. Returns whether a reset happened.
    pub fn sync_live(&mut self, positions: &[Position], status: &MarginStatus) -> bool {
        let unchanged = matches!(
            &self.live,
            Some((p, s)) if p.as_slice() == positions && s == status
        );
        if unchanged {
            return false;
        }
        self.live = Some((positions.to_vec(), status.clone()));
        self.reset(Some(status));
        true
    }

    pub fn nudge_change(&mut self, delta: f64) {
        self.input.nudge_change(delta, self.shock_limit_pct);
        self.result = None;
    }

    pub fn nudge_loan(&mut self, delta: f64) {
        self.input.nudge_loan(delta);
        self.result = None;
    }

    /// Step through `all`, then each symbol in order, then back to `all`.
    pub fn cycle_target(&mut self, symbols: &[String]) {
        let next = match &self.input.target {
            ScenarioTarget::All => symbols.first(),
            ScenarioTarget::Symbol(current) => symbols
                .iter()
                .position(|s| s == current)
                .and_then(|i| symbols.get(i + 1)),
        };
        self.input.target = match next {
            Some(symbol) => ScenarioTarget::Symbol(symbol.clone()),
            None => ScenarioTarget::All,
        };
        self.result = None;
    }

    /// Back to no price move and the live loan balance.
    pub fn reset(&mut self, status: Option<&MarginStatus>) {
        self.input = match status {
            Some(status) => ScenarioInput::from_status(status),
            None => ScenarioInput::new(0.0),
        };
        self.result = None;
    }

    pub fn run(&mut self, engine: &ScenarioEngine, positions: &[Position]) -> &ScenarioResult {
        self.result.insert(engine.simulate(positions, &self.input))
    }
}

/// Outcome of a submitted loan operation.
#[derive(Debug, Clone, PartialEq)]
pub enum LoanFeedback {
    Success {
        action: LoanAction,
        message: String,
        new_loan_amount: f64,
    },
    Failure {
        action: LoanAction,
        message: String,
    },
}

/// Loan amount entry.
#[derive(Debug, Clone, Default)]
pub struct LoanForm {
    amount: String,
    pub pending: Option<LoanAction>,
    pub feedback: Option<LoanFeedback>,
}

impl LoanForm {
    const MAX_INPUT_LEN: usize = 12;

    pub fn input(&self) -> &str {
        &self.amount
    }

    /// Accept digits and a single decimal point.
    pub fn push_char(&mut self, c: char) {
        if self.amount.len() >= Self::MAX_INPUT_LEN {
            return;
        }
        if c.is_ascii_digit() || (c == '.' && !self.amount.contains('.')) {
            self.amount.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.amount.pop();
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount.parse().ok()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record a finished operation; the entry is cleared on success.
    pub fn finish(&mut self, feedback: LoanFeedback) {
        if matches!(feedback, LoanFeedback::Success { .. }) {
            self.amount.clear();
        }
        self.pending = None;
        self.feedback = Some(feedback);
    }
}

/// Price history view: selected symbol and generated series per symbol.
#[derive(Debug, Default)]
pub struct HistoryView {
    selected: usize,
    series: HashMap<String, Vec<PricePoint>>,
}

impl HistoryView {
    pub fn select_next(&mut self, symbol_count: usize) {
        self.selected = if symbol_count == 0 {
            0
        } else {
            (self.selected + 1) % symbol_count
        };
    }

    pub fn selected<'a>(&self, positions: &'a [Position]) -> Option<&'a Position> {
        positions
            .get(self.selected)
            .or_else(|| positions.first())
    }

    /// Series for `position`, generated on first use.
    pub fn series(&mut self, generator: &PriceHistoryGenerator, position: &Position) -> &[PricePoint] {
        self.series
            .entry(position.symbol.clone())
            .or_insert_with(|| generator.generate(position.current_price))
    }

    pub fn regenerate(&mut self) {
        self.series.clear();
    }
}
