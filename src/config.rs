use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;

/// Maintenance margin rate the simulator uses when none is configured.
pub const DEFAULT_MAINTENANCE_MARGIN_RATE: f64 = 0.25;
/// Fraction of portfolio value that may be borrowed in total.
pub const DEFAULT_INITIAL_MARGIN_CAP: f64 = 0.5;
/// Polling period for live data.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Synthetic price history settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryConfig {
    /// Number of days back from today.
    pub days: u32,
    /// Daily volatility as a fraction (0.02 = 2%).
    pub volatility: f64,
}

impl Default for PriceHistoryConfig {
    fn default() -> Self {
        Self {
            days: 30,
            volatility: 0.02,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base URL, including the `/api` prefix.
    pub api_base_url: String,
    /// Client whose account is monitored.
    pub client_id: u64,
    /// Polling period for positions and margin status.
    pub refresh_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Maintenance margin rate used by the scenario simulator.
    pub maintenance_margin_rate: f64,
    /// Loan cap as a fraction of portfolio market value.
    pub initial_margin_cap: f64,
    /// Simulator price move bound, in percent.
    pub scenario_shock_limit_pct: f64,
    /// Synthetic price history settings.
    pub price_history: PriceHistoryConfig,
    /// Run without the terminal UI and only log refresh events.
    pub headless: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://127.0.0.1:5000/api".to_string()),
            client_id: env::var("CLIENT_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            refresh_interval: Duration::from_secs(
                env::var("REFRESH_INTERVAL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            ),
            request_timeout: Duration::from_millis(
                env::var("REQUEST_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10_000),
            ),
            maintenance_margin_rate: env::var("MAINTENANCE_MARGIN_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAINTENANCE_MARGIN_RATE),
            initial_margin_cap: env::var("INITIAL_MARGIN_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INITIAL_MARGIN_CAP),
            scenario_shock_limit_pct: env::var("SCENARIO_SHOCK_LIMIT_PCT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50.0),
            price_history: PriceHistoryConfig {
                days: env::var("PRICE_HISTORY_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
                volatility: env::var("PRICE_HISTORY_VOLATILITY")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.02),
            },
            headless: env::var("HEADLESS")
                .ok()
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Reject settings the calculators cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.is_empty() {
            return Err(AppError::Config("API_BASE_URL must not be empty".to_string()));
        }
        if self.client_id == 0 {
            return Err(AppError::Config("CLIENT_ID must be positive".to_string()));
        }
        if self.refresh_interval.is_zero() {
            return Err(AppError::Config(
                "REFRESH_INTERVAL_SECS must be positive".to_string(),
            ));
        }
        if !(self.maintenance_margin_rate > 0.0 && self.maintenance_margin_rate < 1.0) {
            return Err(AppError::Config(format!(
                "MAINTENANCE_MARGIN_RATE must be in (0, 1), got {}",
                self.maintenance_margin_rate
            )));
        }
        if !(self.initial_margin_cap > 0.0 && self.initial_margin_cap < 1.0) {
            return Err(AppError::Config(format!(
                "INITIAL_MARGIN_CAP must be in (0, 1), got {}",
                self.initial_margin_cap
            )));
        }
        if !(self.scenario_shock_limit_pct > 0.0) {
            return Err(AppError::Config(
                "SCENARIO_SHOCK_LIMIT_PCT must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            client_id: 1,
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            request_timeout: Duration::from_millis(10_000),
            maintenance_margin_rate: DEFAULT_MAINTENANCE_MARGIN_RATE,
            initial_margin_cap: DEFAULT_INITIAL_MARGIN_CAP,
            scenario_shock_limit_pct: 50.0,
            price_history: PriceHistoryConfig::default(),
            headless: false,
        }
    }
}
