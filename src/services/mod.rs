pub mod fallback;
pub mod loan;
pub mod margin;
pub mod portfolio;
pub mod price_history;
pub mod refresh;
pub mod scenario;

pub use fallback::FallbackDataset;
pub use loan::{default_max_loan_increase, max_loan_increase, LoanManager};
pub use margin::{health_percentage, HealthLevel, MarginCalculator};
pub use portfolio::PortfolioAggregator;
pub use price_history::PriceHistoryGenerator;
pub use refresh::{
    AlertState, DashboardSnapshot, DashboardState, DataOrigin, LoadState, LoggingListener,
    RefreshCommander, RefreshEvent, RefreshHandle, RefreshListener, RefreshOutcome,
    RefreshRequester, RefreshSettings,
};
pub use scenario::ScenarioEngine;
