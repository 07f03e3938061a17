//! Terminal UI for monitoring a margin account.

mod app;
mod dashboard;
mod events;
mod history;
mod loan;
mod logs;
mod simulator;
mod state;
mod theme;

pub use app::{run_tui, App, TuiContext};
pub use state::{HistoryView, LoanFeedback, LoanForm, LogBuffer, LogMakeWriter, SimulatorState};
pub use theme::Theme;

/// Route/View enum for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Simulator,
    Loan,
    History,
    Logs,
}

impl Route {
    pub fn all() -> Vec<Self> {
        vec![
            Self::Dashboard,
            Self::Simulator,
            Self::Loan,
            Self::History,
            Self::Logs,
        ]
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Simulator => "Simulator",
            Self::Loan => "Loan",
            Self::History => "History",
            Self::Logs => "Logs",
        }
    }

    /// Route shortcut key. Letters, since the loan view takes digits.
    pub fn key(&self) -> char {
        match self {
            Self::Dashboard => 'd',
            Self::Simulator => 's',
            Self::Loan => 'l',
            Self::History => 'h',
            Self::Logs => 'g',
        }
    }
}
